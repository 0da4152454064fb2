use serde::{Deserialize, Serialize};

use super::types::Risk;

/// Severity-weighted mean of risk scores; zero when nothing is identified.
/// Closed risks do not count.
pub fn overall_score(risks: &[Risk]) -> f64 {
    let (weighted, weights) = risks
        .iter()
        .filter(|r| !r.status.is_closed())
        .fold((0.0, 0.0), |(sum, w), r| {
            let weight = r.severity().weight();
            (sum + r.score() * weight, w + weight)
        });
    if weights > 0.0 {
        weighted / weights
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    pub fn probability(p: f64) -> Self {
        if p >= 0.66 {
            Band::High
        } else if p >= 0.33 {
            Band::Medium
        } else {
            Band::Low
        }
    }

    pub fn impact(i: f64) -> Self {
        if i >= 7.0 {
            Band::High
        } else if i >= 4.0 {
            Band::Medium
        } else {
            Band::Low
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// 3×3 grid of risk ids indexed `[probability][impact]`, low to high
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMatrix {
    pub cells: [[Vec<String>; 3]; 3],
}

impl RiskMatrix {
    pub fn build(risks: &[Risk]) -> Self {
        let mut matrix = RiskMatrix::default();
        for risk in risks {
            let p = Band::probability(risk.probability).index();
            let i = Band::impact(risk.impact).index();
            matrix.cells[p][i].push(risk.id.clone());
        }
        matrix
    }

    pub fn cell(&self, probability: Band, impact: Band) -> &[String] {
        &self.cells[probability.index()][impact.index()]
    }

    /// Risks in the high-probability or high-impact corner
    pub fn hot_spots(&self) -> usize {
        self.cell(Band::High, Band::High).len()
            + self.cell(Band::High, Band::Medium).len()
            + self.cell(Band::Medium, Band::High).len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTrend {
    Improving,
    Stable,
    Worsening,
}

impl RiskTrend {
    pub fn between(previous: Option<f64>, current: f64) -> Self {
        match previous {
            Some(prev) if current < prev - 0.5 => RiskTrend::Improving,
            Some(prev) if current > prev + 0.5 => RiskTrend::Worsening,
            _ => RiskTrend::Stable,
        }
    }
}

impl std::fmt::Display for RiskTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTrend::Improving => write!(f, "improving"),
            RiskTrend::Stable => write!(f, "stable"),
            RiskTrend::Worsening => write!(f, "worsening"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::identify::default_mitigation;
    use crate::risk::types::{RiskCategory, RiskStatus};
    use chrono::NaiveDate;

    fn risk(id: &str, probability: f64, impact: f64) -> Risk {
        Risk {
            id: id.into(),
            category: RiskCategory::Technical,
            title: id.into(),
            description: String::new(),
            probability,
            impact,
            status: RiskStatus::Identified,
            mitigation: default_mitigation(
                RiskCategory::Technical,
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            ),
        }
    }

    #[test]
    fn test_overall_score_weighted_by_severity() {
        // 8.0 critical (w 1.0) and 2.0 low (w 0.4)
        let risks = vec![risk("a", 0.8, 10.0), risk("b", 0.5, 4.0)];
        let expected = (8.0 * 1.0 + 2.0 * 0.4) / 1.4;
        assert!((overall_score(&risks) - expected).abs() < 1e-9);
        assert_eq!(overall_score(&[]), 0.0);
    }

    #[test]
    fn test_closed_risks_excluded() {
        let mut closed = risk("a", 0.9, 10.0);
        closed.status = RiskStatus::Resolved;
        let risks = vec![closed, risk("b", 0.5, 4.0)];
        assert!((overall_score(&risks) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_matrix_placement() {
        let matrix = RiskMatrix::build(&[
            risk("hot", 0.8, 9.0),
            risk("mild", 0.2, 2.0),
            risk("mid", 0.5, 5.0),
        ]);
        assert_eq!(matrix.cell(Band::High, Band::High), ["hot".to_string()]);
        assert_eq!(matrix.cell(Band::Low, Band::Low), ["mild".to_string()]);
        assert_eq!(matrix.cell(Band::Medium, Band::Medium), ["mid".to_string()]);
        assert_eq!(matrix.hot_spots(), 1);
    }

    #[test]
    fn test_trend_dead_band() {
        assert_eq!(RiskTrend::between(None, 6.0), RiskTrend::Stable);
        assert_eq!(RiskTrend::between(Some(6.0), 6.4), RiskTrend::Stable);
        assert_eq!(RiskTrend::between(Some(6.0), 5.0), RiskTrend::Improving);
        assert_eq!(RiskTrend::between(Some(4.0), 5.0), RiskTrend::Worsening);
    }
}
