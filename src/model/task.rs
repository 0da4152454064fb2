//! Task and dependency records supplied by the repository

use serde::{Deserialize, Serialize};

use chrono::NaiveDate;

/// Longest planned duration a single task may carry, a hundred years
pub const MAX_TASK_DAYS: i64 = 36_500;

/// Complexity tier shared by tasks and projects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Trivial,
    Simple,
    #[default]
    Medium,
    Complex,
    Expert,
}

impl Complexity {
    /// Fallback duration in days when a task carries no explicit estimate
    pub fn default_days(self) -> f64 {
        match self {
            Complexity::Trivial => 1.0,
            Complexity::Simple => 3.0,
            Complexity::Medium => 5.0,
            Complexity::Complex => 10.0,
            Complexity::Expert => 15.0,
        }
    }

    /// Optimistic / most-likely / pessimistic multipliers, wider for harder work
    pub fn three_point(self) -> (f64, f64, f64) {
        match self {
            Complexity::Trivial => (0.9, 1.0, 1.2),
            Complexity::Simple => (0.85, 1.0, 1.3),
            Complexity::Medium => (0.8, 1.0, 1.5),
            Complexity::Complex => (0.75, 1.0, 1.8),
            Complexity::Expert => (0.7, 1.0, 2.2),
        }
    }

    pub fn is_high(self) -> bool {
        self >= Complexity::Complex
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Complexity::Trivial => write!(f, "trivial"),
            Complexity::Simple => write!(f, "simple"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::Complex => write!(f, "complex"),
            Complexity::Expert => write!(f, "expert"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Blocked,
    Completed,
}

impl TaskStatus {
    pub fn is_open(self) -> bool {
        self != TaskStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    #[default]
    Development,
    Design,
    Research,
    Testing,
    Deployment,
    Documentation,
    Management,
    Other,
}

impl TaskCategory {
    pub fn duration_multiplier(self) -> f64 {
        match self {
            TaskCategory::Research => 1.5,
            TaskCategory::Testing => 1.2,
            TaskCategory::Deployment => 0.8,
            _ => 1.0,
        }
    }

    /// Skill tag implied by the category alone
    pub fn skill_tag(self) -> Option<&'static str> {
        match self {
            TaskCategory::Development => Some("development"),
            TaskCategory::Design => Some("design"),
            TaskCategory::Research => Some("research"),
            TaskCategory::Testing => Some("testing"),
            TaskCategory::Deployment => Some("devops"),
            TaskCategory::Documentation => Some("documentation"),
            TaskCategory::Management => Some("management"),
            TaskCategory::Other => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Junior,
    #[default]
    Mid,
    Senior,
}

/// A typed skill requirement, decided at the repository boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct SkillRequirement {
    pub name: String,

    #[serde(default)]
    pub level: SkillLevel,
}

impl SkillRequirement {
    pub fn new(name: impl Into<String>, level: SkillLevel) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub estimated_days: Option<f64>,

    #[serde(default)]
    pub estimated_hours: Option<f64>,

    #[serde(default)]
    pub complexity: Complexity,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub category: TaskCategory,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub assigned_resources: Vec<String>,

    #[serde(default)]
    pub skill_requirements: Vec<SkillRequirement>,

    /// Share of the work done, 0.0 ..= 1.0
    #[serde(default)]
    pub progress: f64,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            estimated_days: None,
            estimated_hours: None,
            complexity: Complexity::default(),
            status: TaskStatus::default(),
            category: TaskCategory::default(),
            priority: TaskPriority::default(),
            assigned_resources: Vec::new(),
            skill_requirements: Vec::new(),
            progress: 0.0,
            start_date: None,
            acceptance_criteria: Vec::new(),
        }
    }

    pub fn with_days(mut self, days: f64) -> Self {
        self.estimated_days = Some(days);
        self
    }

    pub fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_category(mut self, category: TaskCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn assigned_to(mut self, resource_id: impl Into<String>) -> Self {
        self.assigned_resources.push(resource_id.into());
        self
    }

    /// Planned duration in whole days: explicit estimate, else hours, else the
    /// complexity default, scaled by the category multiplier. Clamped to
    /// `1..=MAX_TASK_DAYS`.
    pub fn duration_days(&self, hours_per_day: f64) -> i64 {
        let base = self
            .estimated_days
            .filter(|d| *d > 0.0)
            .or_else(|| {
                self.estimated_hours
                    .filter(|h| *h > 0.0)
                    .map(|h| h / hours_per_day)
            })
            .unwrap_or_else(|| self.complexity.default_days());

        let scaled = (base * self.category.duration_multiplier() - 1e-9).ceil() as i64;
        scaled.clamp(1, MAX_TASK_DAYS)
    }

    pub fn effective_progress(&self) -> f64 {
        if self.status == TaskStatus::Completed {
            1.0
        } else {
            self.progress.clamp(0.0, 1.0)
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self.status, TaskStatus::InProgress | TaskStatus::Completed) || self.progress > 0.0
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority >= TaskPriority::High || self.complexity == Complexity::Expert
    }
}

/// Finish-to-start edge: `task_id` cannot start before `depends_on` finishes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Dependency {
    pub task_id: String,
    pub depends_on: String,
}

impl Dependency {
    pub fn new(task_id: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            depends_on: depends_on.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_explicit_days() {
        let task = Task::new("a", "A").with_days(2.0);
        assert_eq!(task.duration_days(8.0), 2);
    }

    #[test]
    fn test_duration_from_hours_rounds_up() {
        let mut task = Task::new("a", "A");
        task.estimated_hours = Some(12.0);
        assert_eq!(task.duration_days(8.0), 2);
    }

    #[test]
    fn test_duration_complexity_fallback_with_multiplier() {
        let task = Task::new("r", "Research")
            .with_complexity(Complexity::Medium)
            .with_category(TaskCategory::Research);
        // 5 days * 1.5
        assert_eq!(task.duration_days(8.0), 8);

        let deploy = Task::new("d", "Deploy")
            .with_complexity(Complexity::Trivial)
            .with_category(TaskCategory::Deployment);
        // 0.8 rounds up to the 1 day minimum
        assert_eq!(deploy.duration_days(8.0), 1);
    }

    #[test]
    fn test_huge_estimate_is_capped() {
        let task = Task::new("a", "A").with_days(2.0e8);
        assert_eq!(task.duration_days(8.0), MAX_TASK_DAYS);

        let mut forever = Task::new("b", "B");
        forever.estimated_hours = Some(f64::INFINITY);
        assert_eq!(forever.duration_days(8.0), MAX_TASK_DAYS);
    }

    #[test]
    fn test_expert_is_high_priority() {
        let task = Task::new("x", "X").with_complexity(Complexity::Expert);
        assert!(task.is_high_priority());
        assert!(!Task::new("y", "Y").is_high_priority());
    }

    #[test]
    fn test_task_deserializes_with_defaults() {
        let json = r#"{"id": "t1", "title": "Build API", "status": "in_progress", "skill_requirements": [{"name": "rust"}]}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.skill_requirements[0].level, SkillLevel::Mid);
        assert_eq!(task.complexity, Complexity::Medium);
    }
}
