//! Input records consumed by the planning engine
//!
//! These are the contracts with the external repository. They are read-only
//! during a planning pass; every analyzer receives the same snapshot.

mod budget;
mod project;
mod resource;
mod task;

pub use budget::{BudgetCategory, Expense};
pub use project::{Milestone, Phase, Project, ProjectType};
pub use resource::{DateWindow, Resource, ResourceAssignment, ResourceType};
pub use task::{
    Complexity, Dependency, SkillLevel, SkillRequirement, Task, TaskCategory, TaskPriority,
    TaskStatus, MAX_TASK_DAYS,
};

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::risk::RiskHistoryRecord;

/// Everything one planning pass reads, fetched at once
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectSnapshot {
    pub project: Project,

    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,

    #[serde(default)]
    pub resources: Vec<Resource>,

    #[serde(default)]
    pub assignments: Vec<ResourceAssignment>,

    #[serde(default)]
    pub budgets: Vec<BudgetCategory>,

    #[serde(default)]
    pub expenses: Vec<Expense>,

    #[serde(default)]
    pub phases: Vec<Phase>,

    #[serde(default)]
    pub milestones: Vec<Milestone>,

    #[serde(default)]
    pub risk_history: Vec<RiskHistoryRecord>,

    /// Overall risk score of the previous assessment, for trend detection
    #[serde(default)]
    pub previous_risk_score: Option<f64>,

    /// Reference date for progress-to-date metrics; today when absent
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

impl ProjectSnapshot {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            tasks: Vec::new(),
            dependencies: Vec::new(),
            resources: Vec::new(),
            assignments: Vec::new(),
            budgets: Vec::new(),
            expenses: Vec::new(),
            phases: Vec::new(),
            milestones: Vec::new(),
            risk_history: Vec::new(),
            previous_risk_score: None,
            as_of: None,
        }
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Every per-resource view is keyed by id, so ids must be unique
    pub fn check_resource_ids(&self) -> Result<(), ScheduleError> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if !seen.insert(resource.id.as_str()) {
                return Err(ScheduleError::DuplicateResource(resource.id.clone()));
            }
        }
        Ok(())
    }

    pub fn total_allocated(&self) -> f64 {
        self.budgets.iter().map(BudgetCategory::total_allocated).sum()
    }

    pub fn total_spent(&self) -> f64 {
        self.budgets.iter().map(BudgetCategory::total_spent).sum::<f64>()
            + self.expenses.iter().map(|e| e.amount).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_resource_id_rejected() {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut snap = ProjectSnapshot::new(Project::new("p", "P", start));
        snap.resources = vec![
            Resource::new("r", "Rae", ResourceType::Human),
            Resource::new("s", "Sam", ResourceType::Human),
        ];
        assert!(snap.check_resource_ids().is_ok());

        snap.resources.push(Resource::new("r", "Rae", ResourceType::Equipment));
        assert_eq!(
            snap.check_resource_ids(),
            Err(ScheduleError::DuplicateResource("r".into()))
        );
    }
}
