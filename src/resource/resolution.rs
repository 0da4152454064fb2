//! Resource conflicts and their ranked resolution options

use serde::{Deserialize, Serialize};

use crate::timeline::ConflictSeverity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    Hire,
    Reallocate,
    ReduceScope,
    Train,
    Outsource,
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionStrategy::Hire => write!(f, "hire"),
            ResolutionStrategy::Reallocate => write!(f, "reallocate"),
            ResolutionStrategy::ReduceScope => write!(f, "reduce scope"),
            ResolutionStrategy::Train => write!(f, "train"),
            ResolutionStrategy::Outsource => write!(f, "outsource"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOption {
    pub strategy: ResolutionStrategy,
    pub description: String,
    /// 1 (trivial) ..= 10 (major undertaking)
    pub effort: f64,
    pub cost: f64,
    pub days: f64,
    /// 1 ..= 10
    pub effectiveness: f64,
    pub score: f64,
}

impl ResolutionOption {
    fn new(
        strategy: ResolutionStrategy,
        description: String,
        effort: f64,
        cost: f64,
        days: f64,
        effectiveness: f64,
    ) -> Self {
        Self {
            strategy,
            description,
            effort,
            cost,
            days,
            effectiveness,
            score: resolution_score(effectiveness, effort, days),
        }
    }
}

/// `effectiveness×0.4 + (10−effort)×0.3 + (30−days)/30×0.3`
pub fn resolution_score(effectiveness: f64, effort: f64, days: f64) -> f64 {
    effectiveness * 0.4 + (10.0 - effort) * 0.3 + (30.0 - days) / 30.0 * 0.3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConflictKind {
    OverAllocation { utilization: f64 },
    SkillMismatch { task_id: String, score: f64, missing: Vec<String> },
    DoubleBooking { first_task: String, second_task: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConflict {
    pub resource_id: String,
    pub kind: ConflictKind,
    pub severity: ConflictSeverity,
    pub description: String,
    /// Ranked best first
    pub options: Vec<ResolutionOption>,
}

impl ResourceConflict {
    pub fn best_option(&self) -> Option<&ResolutionOption> {
        self.options.first()
    }
}

/// Inputs for costing the options of one conflict
pub struct CostBasis {
    pub rate: f64,
    pub market_rate: f64,
    pub hours: f64,
}

pub fn options_for(kind: &ConflictKind, basis: &CostBasis) -> Vec<ResolutionOption> {
    use ResolutionStrategy::*;

    let mut options = match kind {
        ConflictKind::OverAllocation { utilization } => vec![
            ResolutionOption::new(
                Reallocate,
                format!(
                    "Shift {:.0}% of the workload to under-used teammates",
                    utilization - 100.0
                ),
                3.0,
                0.0,
                3.0,
                7.0,
            ),
            ResolutionOption::new(
                Hire,
                "Bring in an additional team member for the overflow".to_string(),
                7.0,
                basis.hours * basis.market_rate * 1.2,
                30.0,
                9.0,
            ),
            ResolutionOption::new(
                ReduceScope,
                "Defer lower-priority work assigned to this resource".to_string(),
                4.0,
                0.0,
                5.0,
                6.0,
            ),
        ],
        ConflictKind::SkillMismatch { missing, .. } => vec![
            ResolutionOption::new(
                Train,
                format!("Train on: {}", missing.join(", ")),
                5.0,
                1500.0 + 500.0 * missing.len() as f64,
                14.0,
                7.0,
            ),
            ResolutionOption::new(
                Reallocate,
                "Swap the task to a teammate with a closer skill profile".to_string(),
                3.0,
                0.0,
                5.0,
                6.0,
            ),
            ResolutionOption::new(
                Outsource,
                "Contract a specialist for this task".to_string(),
                6.0,
                basis.hours * basis.market_rate.max(basis.rate) * 1.3,
                10.0,
                8.0,
            ),
        ],
        ConflictKind::DoubleBooking { .. } => vec![
            ResolutionOption::new(
                Reallocate,
                "Reschedule one of the overlapping assignments".to_string(),
                2.0,
                0.0,
                2.0,
                8.0,
            ),
            ResolutionOption::new(
                ReduceScope,
                "Trim the lower-priority task to fit the overlap".to_string(),
                4.0,
                0.0,
                5.0,
                5.0,
            ),
            ResolutionOption::new(
                Hire,
                "Add temporary capacity for the overlap window".to_string(),
                7.0,
                basis.hours * basis.market_rate * 1.2,
                21.0,
                8.0,
            ),
        ],
    };

    options.sort_by(|a, b| b.score.total_cmp(&a.score));
    options
}
