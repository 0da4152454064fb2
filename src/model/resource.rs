use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::MarketRates;

use super::task::TaskPriority;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Human,
    Equipment,
    Software,
    Space,
}

impl ResourceType {
    pub fn market_rate(self, rates: &MarketRates) -> f64 {
        match self {
            ResourceType::Human => rates.human,
            ResourceType::Equipment => rates.equipment,
            ResourceType::Software => rates.software,
            ResourceType::Space => rates.space,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Human => write!(f, "human"),
            ResourceType::Equipment => write!(f, "equipment"),
            ResourceType::Software => write!(f, "software"),
            ResourceType::Space => write!(f, "space"),
        }
    }
}

/// Inclusive calendar window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &DateWindow) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Resource {
    pub id: String,

    pub name: String,

    #[serde(default, rename = "type")]
    pub kind: ResourceType,

    #[serde(default)]
    pub hourly_rate: Option<f64>,

    #[serde(default)]
    pub skills: Vec<String>,

    /// Hours available over the planning horizon
    #[serde(default)]
    pub capacity_hours: f64,

    /// Share of the resource dedicated to this project, in percent
    #[serde(default = "default_allocation")]
    pub allocation_percent: f64,

    #[serde(default)]
    pub availability: Option<DateWindow>,

    /// Observed output per paid hour, 0.0 ..= 1.0
    #[serde(default)]
    pub efficiency: Option<f64>,
}

fn default_allocation() -> f64 {
    100.0
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ResourceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            hourly_rate: None,
            skills: Vec::new(),
            capacity_hours: 160.0,
            allocation_percent: default_allocation(),
            availability: None,
            efficiency: None,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.hourly_rate = Some(rate);
        self
    }

    pub fn with_skills(mut self, skills: &[&str]) -> Self {
        self.skills = skills.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_capacity(mut self, hours: f64) -> Self {
        self.capacity_hours = hours;
        self
    }

    /// Declared rate raised to `floor` of the market rate for its type
    pub fn effective_rate(&self, rates: &MarketRates, floor: f64) -> f64 {
        let market_floor = self.kind.market_rate(rates) * floor;
        self.hourly_rate.unwrap_or(0.0).max(market_floor)
    }

    /// Hours of this resource available to the project
    pub fn project_hours(&self) -> f64 {
        self.capacity_hours * self.allocation_percent / 100.0
    }

    pub fn shares_skill_with(&self, other: &Resource) -> bool {
        self.skills.iter().any(|a| {
            other
                .skills
                .iter()
                .any(|b| a.eq_ignore_ascii_case(b))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResourceAssignment {
    pub resource_id: String,

    pub task_id: String,

    /// Workload share of the resource, in percent
    pub allocation_percent: f64,

    #[serde(default)]
    pub hours: Option<f64>,

    pub window: DateWindow,

    #[serde(default)]
    pub priority: TaskPriority,
}

impl ResourceAssignment {
    pub fn new(
        resource_id: impl Into<String>,
        task_id: impl Into<String>,
        allocation_percent: f64,
        window: DateWindow,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            task_id: task_id.into(),
            allocation_percent,
            hours: None,
            window,
            priority: TaskPriority::default(),
        }
    }

    /// Explicit hours, else the percentage of the resource's project hours
    pub fn allocated_hours(&self, resource: &Resource) -> f64 {
        self.hours
            .unwrap_or_else(|| resource.project_hours() * self.allocation_percent / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_window_overlap_inclusive() {
        let a = DateWindow::new(d(2025, 1, 1), d(2025, 1, 10));
        let b = DateWindow::new(d(2025, 1, 10), d(2025, 1, 20));
        let c = DateWindow::new(d(2025, 1, 11), d(2025, 1, 20));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.days(), 10);
    }

    #[test]
    fn test_effective_rate_market_floor() {
        let rates = MarketRates::default();
        let cheap = Resource::new("r1", "Dev", ResourceType::Human).with_rate(40.0);
        assert_eq!(cheap.effective_rate(&rates, 0.8), 60.0);

        let pricey = Resource::new("r2", "Dev", ResourceType::Human).with_rate(120.0);
        assert_eq!(pricey.effective_rate(&rates, 0.8), 120.0);

        let unknown = Resource::new("r3", "Server", ResourceType::Equipment);
        assert_eq!(unknown.effective_rate(&rates, 0.8), 20.0);
    }

    #[test]
    fn test_shares_skill_case_insensitive() {
        let a = Resource::new("a", "A", ResourceType::Human).with_skills(&["Rust", "SQL"]);
        let b = Resource::new("b", "B", ResourceType::Human).with_skills(&["sql"]);
        let c = Resource::new("c", "C", ResourceType::Human).with_skills(&["design"]);
        assert!(a.shares_skill_with(&b));
        assert!(!a.shares_skill_with(&c));
    }
}
