//! Plan records produced by the project planner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::budget::BudgetAnalysis;
use crate::config::{Aggressiveness, Config, OptimizationPriority};
use crate::model::{
    BudgetCategory, Dependency, Expense, ProjectSnapshot, Resource, ResourceAssignment, Task,
};
use crate::resource::AllocationPlan;
use crate::risk::RiskAssessment;
use crate::timeline::Schedule;

use super::alternatives::Alternative;
use super::feasibility::Feasibility;
use super::monitoring::MonitoringFramework;

/// Caller choices for one planning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOptions {
    pub priority: OptimizationPriority,

    pub aggressiveness: Aggressiveness,

    /// Apply proposed reallocations and re-assess risk on the result
    pub refine: bool,
}

impl PlanOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            priority: config.planning.priority,
            aggressiveness: config.planning.aggressiveness,
            refine: true,
        }
    }
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            priority: OptimizationPriority::default(),
            aggressiveness: Aggressiveness::default(),
            refine: true,
        }
    }
}

/// Hash of the inputs each analyzer reads. An analyzer is recomputed on update
/// only when its fingerprint moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFingerprints {
    pub timeline: String,
    pub resources: String,
    pub budget: String,
}

fn digest<T: Serialize>(value: &T) -> String {
    // serializing plain records cannot fail; an empty payload still hashes
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    format!("{:x}", Sha256::digest(&bytes))[..16].to_string()
}

impl InputFingerprints {
    pub fn of(snapshot: &ProjectSnapshot) -> Self {
        let s = snapshot;
        // resolve "today" so a plan computed yesterday is not reused
        let as_of = s.as_of();
        Self {
            timeline: digest(&(
                &s.project,
                &s.tasks,
                &s.dependencies,
                &s.assignments,
                as_of,
            )),
            resources: digest(&(&s.resources, &s.tasks, &s.assignments)),
            budget: digest(&(
                &s.project,
                &s.tasks,
                &s.resources,
                &s.assignments,
                &s.budgets,
                &s.expenses,
                as_of,
            )),
        }
    }
}

/// One immutable, versioned planning result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensivePlan {
    pub id: Uuid,

    /// Monotonically increasing per project
    pub version: u32,

    pub created_at: DateTime<Utc>,

    pub project_id: String,

    pub options: PlanOptions,

    /// Inputs the plan was computed from
    pub snapshot: ProjectSnapshot,

    pub fingerprints: InputFingerprints,

    pub schedule: Schedule,

    pub allocation: AllocationPlan,

    pub budget: BudgetAnalysis,

    pub risk: RiskAssessment,

    pub feasibility: Feasibility,

    /// 0.0 ..= 1.0
    pub success_probability: f64,

    /// 0.0 ..= 1.0
    pub confidence: f64,

    /// 0 ..= 100
    pub health_score: f64,

    pub alternatives: Vec<Alternative>,

    pub monitoring: MonitoringFramework,
}

impl ComprehensivePlan {
    pub fn recommended_alternative(&self) -> Option<&Alternative> {
        self.alternatives
            .iter()
            .max_by(|a, b| a.recommendation_score.total_cmp(&b.recommendation_score))
    }
}

/// Partial inputs for the update path; `None` keeps the plan's current value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanUpdate {
    #[serde(default)]
    pub tasks: Option<Vec<Task>>,

    #[serde(default)]
    pub dependencies: Option<Vec<Dependency>>,

    #[serde(default)]
    pub resources: Option<Vec<Resource>>,

    #[serde(default)]
    pub assignments: Option<Vec<ResourceAssignment>>,

    #[serde(default)]
    pub budgets: Option<Vec<BudgetCategory>>,

    #[serde(default)]
    pub expenses: Option<Vec<Expense>>,
}

impl PlanUpdate {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_none()
            && self.dependencies.is_none()
            && self.resources.is_none()
            && self.assignments.is_none()
            && self.budgets.is_none()
            && self.expenses.is_none()
    }

    /// Overlay the changed inputs on a copy of `snapshot`
    pub fn apply(&self, snapshot: &ProjectSnapshot) -> ProjectSnapshot {
        let mut next = snapshot.clone();
        if let Some(tasks) = &self.tasks {
            next.tasks = tasks.clone();
        }
        if let Some(dependencies) = &self.dependencies {
            next.dependencies = dependencies.clone();
        }
        if let Some(resources) = &self.resources {
            next.resources = resources.clone();
        }
        if let Some(assignments) = &self.assignments {
            next.assignments = assignments.clone();
        }
        if let Some(budgets) = &self.budgets {
            next.budgets = budgets.clone();
        }
        if let Some(expenses) = &self.expenses {
            next.expenses = expenses.clone();
        }
        next
    }
}
