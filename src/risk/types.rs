use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::RiskError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Technical,
    Schedule,
    Budget,
    Resource,
    Scope,
    Quality,
    External,
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskCategory::Technical => write!(f, "technical"),
            RiskCategory::Schedule => write!(f, "schedule"),
            RiskCategory::Budget => write!(f, "budget"),
            RiskCategory::Resource => write!(f, "resource"),
            RiskCategory::Scope => write!(f, "scope"),
            RiskCategory::Quality => write!(f, "quality"),
            RiskCategory::External => write!(f, "external"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskSeverity {
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            RiskSeverity::Critical
        } else if score >= 5.0 {
            RiskSeverity::High
        } else if score >= 3.0 {
            RiskSeverity::Medium
        } else {
            RiskSeverity::Low
        }
    }

    /// Weight in the overall score
    pub fn weight(self) -> f64 {
        match self {
            RiskSeverity::Critical => 1.0,
            RiskSeverity::High => 0.8,
            RiskSeverity::Medium => 0.6,
            RiskSeverity::Low => 0.4,
        }
    }
}

impl std::fmt::Display for RiskSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskSeverity::Low => write!(f, "low"),
            RiskSeverity::Medium => write!(f, "medium"),
            RiskSeverity::High => write!(f, "high"),
            RiskSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Band of the overall project risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            RiskLevel::Critical
        } else if score >= 5.0 {
            RiskLevel::High
        } else if score >= 3.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Moderate => write!(f, "moderate"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskStatus {
    #[default]
    Identified,
    Assessed,
    Mitigated,
    Resolved,
    Realized,
}

impl RiskStatus {
    pub fn is_closed(self) -> bool {
        matches!(self, RiskStatus::Resolved | RiskStatus::Realized)
    }

    /// identified -> assessed -> mitigated -> resolved; any open state may be
    /// realized.
    pub fn can_transition_to(self, next: RiskStatus) -> bool {
        use RiskStatus::*;
        matches!(
            (self, next),
            (Identified, Assessed)
                | (Assessed, Mitigated)
                | (Mitigated, Resolved)
                | (Identified | Assessed | Mitigated, Realized)
        )
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskStatus::Identified => write!(f, "identified"),
            RiskStatus::Assessed => write!(f, "assessed"),
            RiskStatus::Mitigated => write!(f, "mitigated"),
            RiskStatus::Resolved => write!(f, "resolved"),
            RiskStatus::Realized => write!(f, "realized"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MitigationApproach {
    Avoid,
    Mitigate,
    Transfer,
    Accept,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MitigationStrategy {
    pub approach: MitigationApproach,
    pub description: String,
    pub cost: f64,
    pub days_to_implement: i64,
    /// Expected reduction of the risk score, 0.0 ..= 1.0
    pub effectiveness: f64,
    pub owner: String,
    pub deadline: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Risk {
    pub id: String,
    pub category: RiskCategory,
    pub title: String,
    pub description: String,
    /// 0.0 ..= 1.0
    pub probability: f64,
    /// 1.0 ..= 10.0
    pub impact: f64,
    #[serde(default)]
    pub status: RiskStatus,
    pub mitigation: MitigationStrategy,
}

impl Risk {
    pub fn score(&self) -> f64 {
        self.probability * self.impact
    }

    pub fn severity(&self) -> RiskSeverity {
        RiskSeverity::from_score(self.score())
    }

    pub fn transition(&mut self, next: RiskStatus) -> Result<(), RiskError> {
        if !self.status.can_transition_to(next) {
            return Err(RiskError::InvalidTransition {
                risk_id: self.id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Outcome counts of past risks in one category, used to calibrate new
/// probabilities
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RiskHistoryRecord {
    pub category: RiskCategory,
    pub identified: u32,
    pub realized: u32,
}

impl RiskHistoryRecord {
    pub fn realization_rate(&self) -> Option<f64> {
        (self.identified > 0)
            .then(|| self.realized.min(self.identified) as f64 / self.identified as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(probability: f64, impact: f64) -> Risk {
        Risk {
            id: "r1".into(),
            category: RiskCategory::Budget,
            title: "Overspend".into(),
            description: String::new(),
            probability,
            impact,
            status: RiskStatus::Identified,
            mitigation: MitigationStrategy {
                approach: MitigationApproach::Mitigate,
                description: String::new(),
                cost: 0.0,
                days_to_implement: 1,
                effectiveness: 0.5,
                owner: "PM".into(),
                deadline: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            },
        }
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(risk(0.8, 10.0).severity(), RiskSeverity::Critical);
        assert_eq!(risk(0.5, 10.0).severity(), RiskSeverity::High);
        assert_eq!(risk(0.5, 6.0).severity(), RiskSeverity::Medium);
        assert_eq!(risk(0.2, 5.0).severity(), RiskSeverity::Low);
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut r = risk(0.5, 5.0);
        r.transition(RiskStatus::Assessed).unwrap();
        r.transition(RiskStatus::Mitigated).unwrap();
        r.transition(RiskStatus::Resolved).unwrap();
        let err = r.transition(RiskStatus::Realized).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid risk status transition for 'r1' from resolved to realized"
        );
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        let mut r = risk(0.5, 5.0);
        assert!(r.transition(RiskStatus::Resolved).is_err());
        assert_eq!(r.status, RiskStatus::Identified);
        r.transition(RiskStatus::Realized).unwrap();
        assert!(r.status.is_closed());
    }
}
