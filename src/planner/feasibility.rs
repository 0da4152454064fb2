//! Feasibility scoring and the composite scores derived from it

use serde::{Deserialize, Serialize};

use crate::budget::{BudgetAnalysis, BudgetHealth};
use crate::config::Aggressiveness;
use crate::model::ProjectSnapshot;
use crate::resource::AllocationPlan;
use crate::risk::{RiskAssessment, RiskCategory, RiskSeverity};
use crate::timeline::{ConflictSeverity, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeasibilityVerdict {
    Critical,
    Low,
    Medium,
    High,
}

impl FeasibilityVerdict {
    pub fn from_score(score: f64) -> Self {
        if score >= 8.0 {
            FeasibilityVerdict::High
        } else if score >= 6.0 {
            FeasibilityVerdict::Medium
        } else if score >= 4.0 {
            FeasibilityVerdict::Low
        } else {
            FeasibilityVerdict::Critical
        }
    }
}

impl std::fmt::Display for FeasibilityVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeasibilityVerdict::High => write!(f, "high"),
            FeasibilityVerdict::Medium => write!(f, "medium"),
            FeasibilityVerdict::Low => write!(f, "low"),
            FeasibilityVerdict::Critical => write!(f, "critical"),
        }
    }
}

/// Per-dimension scores, each 0 ..= 10
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub technical: f64,
    pub resource: f64,
    pub budget: f64,
    pub timeline: f64,
    pub risk: f64,
}

impl DimensionScores {
    /// Sum of the five dimensions, 0 ..= 50
    pub fn total(&self) -> f64 {
        self.technical + self.resource + self.budget + self.timeline + self.risk
    }

    pub fn average(&self) -> f64 {
        self.total() / 5.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feasibility {
    pub scores: DimensionScores,
    pub overall: f64,
    pub verdict: FeasibilityVerdict,
    /// One line per applied penalty
    pub concerns: Vec<String>,
}

/// Running score for one dimension that records why it lost points
struct Dimension<'a> {
    name: &'static str,
    score: f64,
    concerns: &'a mut Vec<String>,
}

impl<'a> Dimension<'a> {
    fn new(name: &'static str, concerns: &'a mut Vec<String>) -> Self {
        Self {
            name,
            score: 10.0,
            concerns,
        }
    }

    fn penalize(&mut self, when: bool, points: f64, reason: impl FnOnce() -> String) {
        if when && points > 0.0 {
            self.score -= points;
            self.concerns
                .push(format!("{} -{:.1}: {}", self.name, points, reason()));
        }
    }

    fn finish(self) -> f64 {
        self.score.clamp(0.0, 10.0)
    }
}

pub fn assess_feasibility(
    snapshot: &ProjectSnapshot,
    schedule: &Schedule,
    allocation: &AllocationPlan,
    budget: &BudgetAnalysis,
    risk: &RiskAssessment,
) -> Feasibility {
    let mut concerns = Vec::new();

    let technical = {
        let mut d = Dimension::new("technical", &mut concerns);
        d.penalize(schedule.completion_probability < 0.7, 2.0, || {
            format!(
                "completion probability {:.0}% is below 70%",
                schedule.completion_probability * 100.0
            )
        });
        let severe = risk
            .by_category(RiskCategory::Technical)
            .filter(|r| r.severity() >= RiskSeverity::High)
            .count();
        d.penalize(severe > 0, (severe as f64).min(3.0), || {
            format!("{} high-severity technical risk(s)", severe)
        });
        d.penalize(schedule.critical_ratio() > 0.6, 1.0, || {
            format!(
                "{:.0}% of tasks are on the critical path",
                schedule.critical_ratio() * 100.0
            )
        });
        d.finish()
    };

    let resource = {
        let mut d = Dimension::new("resource", &mut concerns);
        let over = allocation.over_allocated().count();
        d.penalize(over > 0, (over as f64 * 1.5).min(4.0), || {
            format!("{} over-allocated resource(s)", over)
        });
        let critical = allocation
            .conflicts
            .iter()
            .filter(|c| c.severity == ConflictSeverity::Critical)
            .count();
        d.penalize(critical > 0, 1.0, || {
            format!("{} critical resource conflict(s)", critical)
        });
        d.penalize(!allocation.unassigned.is_empty(), 1.0, || {
            format!("{} task(s) could not be staffed", allocation.unassigned.len())
        });
        d.penalize(
            !allocation.allocations.is_empty() && allocation.optimized_utilization < 50.0,
            1.0,
            || {
                format!(
                    "team utilization of {:.0}% leaves capacity idle",
                    allocation.optimized_utilization
                )
            },
        );
        d.finish()
    };

    let budget_score = {
        let mut d = Dimension::new("budget", &mut concerns);
        d.penalize(budget.forecast.over_budget(), 2.0, || {
            format!(
                "forecast at completion {:.0} exceeds budget {:.0}",
                budget.forecast.eac, budget.forecast.budget_at_completion
            )
        });
        let health_penalty = match budget.performance.health {
            BudgetHealth::Good => 0.0,
            BudgetHealth::Warning => 1.0,
            BudgetHealth::Critical => 3.0,
        };
        d.penalize(health_penalty > 0.0, health_penalty, || {
            format!("spend health is {}", budget.performance.health)
        });
        let needed = budget.estimate.with_contingency();
        d.penalize(needed > budget.baseline + 1e-9, 2.0, || {
            format!(
                "estimate with contingency {:.0} exceeds the baseline {:.0}",
                needed, budget.baseline
            )
        });
        d.finish()
    };

    let timeline = {
        let mut d = Dimension::new("timeline", &mut concerns);
        let p = schedule.completion_probability;
        let points = if p < 0.5 {
            3.0
        } else if p < 0.7 {
            1.5
        } else {
            0.0
        };
        d.penalize(points > 0.0, points, || {
            format!("completion probability {:.0}%", p * 100.0)
        });
        if let Some(target) = snapshot.project.target_end_date {
            d.penalize(schedule.end > target, 2.0, || {
                format!("scheduled end {} is after the target {}", schedule.end, target)
            });
        }
        let behind = schedule.schedule_variance.behind_schedule.len();
        d.penalize(behind > 0, (behind as f64 * 0.5).min(2.0), || {
            format!("{} task(s) behind schedule", behind)
        });
        if let Some(sim) = &risk.simulation {
            d.penalize(sim.on_time_probability < 0.5, 2.0, || {
                format!(
                    "{:.0}% of simulated outcomes meet the deadline",
                    sim.on_time_probability * 100.0
                )
            });
        }
        d.finish()
    };

    let risk_score = {
        let mut d = Dimension::new("risk", &mut concerns);
        d.penalize(risk.overall_score > 0.0, risk.overall_score, || {
            format!("overall risk score {:.1}", risk.overall_score)
        });
        let active = risk.contingency_plan.active().count();
        d.penalize(active > 0, active as f64 * 0.5, || {
            format!("{} contingency trigger(s) active", active)
        });
        d.finish()
    };

    let scores = DimensionScores {
        technical,
        resource,
        budget: budget_score,
        timeline,
        risk: risk_score,
    };
    let overall = scores.average();

    Feasibility {
        scores,
        overall,
        verdict: FeasibilityVerdict::from_score(overall),
        concerns,
    }
}

/// Mean of feasibility, on-time completion, staffing and risk headroom
pub fn success_probability(
    feasibility: &Feasibility,
    completion_probability: f64,
    optimized_utilization: f64,
    risk_score: f64,
) -> f64 {
    let parts = [
        feasibility.scores.total() / 50.0,
        completion_probability,
        (optimized_utilization / 85.0).min(1.0),
        (10.0 - risk_score) / 10.0,
    ];
    (parts.iter().sum::<f64>() / parts.len() as f64).clamp(0.0, 1.0)
}

/// Aggressive optimization erodes confidence in the result
pub fn confidence_level(
    feasibility: &Feasibility,
    risk_score: f64,
    aggressiveness: Aggressiveness,
) -> f64 {
    let value = 0.5 * feasibility.overall / 10.0
        + 0.3 * (10.0 - risk_score) / 10.0
        + 0.2 * (1.0 - aggressiveness.factor());
    value.clamp(0.0, 1.0)
}

pub fn health_score(
    feasibility: &Feasibility,
    risk_score: f64,
    aggressiveness: Aggressiveness,
) -> f64 {
    let value = 40.0 * feasibility.overall / 10.0
        + 40.0 * (10.0 - risk_score) / 10.0
        + 20.0 * (1.0 - aggressiveness.factor() / 2.0);
    value.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feasibility(score: f64) -> Feasibility {
        let scores = DimensionScores {
            technical: score,
            resource: score,
            budget: score,
            timeline: score,
            risk: score,
        };
        Feasibility {
            scores,
            overall: scores.average(),
            verdict: FeasibilityVerdict::from_score(score),
            concerns: Vec::new(),
        }
    }

    #[test]
    fn test_verdict_bands() {
        assert_eq!(FeasibilityVerdict::from_score(8.0), FeasibilityVerdict::High);
        assert_eq!(FeasibilityVerdict::from_score(7.9), FeasibilityVerdict::Medium);
        assert_eq!(FeasibilityVerdict::from_score(6.0), FeasibilityVerdict::Medium);
        assert_eq!(FeasibilityVerdict::from_score(4.0), FeasibilityVerdict::Low);
        assert_eq!(FeasibilityVerdict::from_score(3.9), FeasibilityVerdict::Critical);
    }

    #[test]
    fn test_success_probability_is_mean_of_four() {
        // 40/50, 0.9, min(1, 68/85), (10-2)/10
        let p = success_probability(&feasibility(8.0), 0.9, 68.0, 2.0);
        let expected = (0.8 + 0.9 + 0.8 + 0.8) / 4.0;
        assert!((p - expected).abs() < 1e-9);

        // utilization beyond 85 % saturates
        let saturated = success_probability(&feasibility(10.0), 1.0, 120.0, 0.0);
        assert!((saturated - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggressiveness_lowers_confidence_and_health() {
        let f = feasibility(8.0);
        let calm = confidence_level(&f, 3.0, Aggressiveness::Conservative);
        let bold = confidence_level(&f, 3.0, Aggressiveness::Aggressive);
        assert!(calm > bold);
        // 0.5*0.8 + 0.3*0.7 + 0.2*0.8
        assert!((calm - 0.77).abs() < 1e-9);

        let health = health_score(&f, 3.0, Aggressiveness::Balanced);
        // 32 + 28 + 15
        assert!((health - 75.0).abs() < 1e-9);
    }
}
