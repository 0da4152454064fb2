use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::Complexity;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Web,
    Mobile,
    Data,
    Infrastructure,
    Research,
    Other,
}

impl ProjectType {
    /// Technology spend as a share of the resource base cost
    pub fn technology_factor(self) -> f64 {
        match self {
            ProjectType::Web => 0.08,
            ProjectType::Mobile => 0.10,
            ProjectType::Data => 0.15,
            ProjectType::Infrastructure => 0.12,
            ProjectType::Research => 0.06,
            ProjectType::Other => 0.08,
        }
    }

    /// Infrastructure spend as a share of the resource base cost
    pub fn infrastructure_factor(self) -> f64 {
        match self {
            ProjectType::Web => 0.06,
            ProjectType::Mobile => 0.05,
            ProjectType::Data => 0.12,
            ProjectType::Infrastructure => 0.20,
            ProjectType::Research => 0.04,
            ProjectType::Other => 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Project {
    pub id: String,

    pub name: String,

    #[serde(default, rename = "type")]
    pub project_type: ProjectType,

    #[serde(default)]
    pub complexity: Complexity,

    pub start_date: NaiveDate,

    #[serde(default)]
    pub target_end_date: Option<NaiveDate>,

    /// Budget ceiling set by the sponsor
    #[serde(default)]
    pub budget: Option<f64>,

    #[serde(default)]
    pub acceptance_criteria: Vec<String>,

    /// Technologies the team has not shipped with before
    #[serde(default)]
    pub emerging_technologies: Vec<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_type: ProjectType::default(),
            complexity: Complexity::default(),
            start_date,
            target_end_date: None,
            budget: None,
            acceptance_criteria: Vec::new(),
            emerging_technologies: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Phase {
    pub id: String,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Milestone {
    pub id: String,
    pub name: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub task_ids: Vec<String>,
}
