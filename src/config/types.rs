use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory holding `<project>.json` snapshots and stored plans
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Upper bound for one planning pass, repository I/O included
    #[serde(default = "default_deadline_sec")]
    pub deadline_sec: u64,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub timeline: TimelineConfig,

    #[serde(default)]
    pub resources: ResourceConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub risk: RiskConfig,

    #[serde(default)]
    pub planning: PlanningConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct TimelineConfig {
    #[serde(default = "default_base_completion_probability")]
    pub base_completion_probability: f64,

    /// Subtracted per critical task that is behind schedule
    #[serde(default = "default_behind_schedule_penalty")]
    pub behind_schedule_penalty: f64,

    /// Subtracted per unresolved resource conflict
    #[serde(default = "default_conflict_penalty")]
    pub conflict_penalty: f64,

    /// Mean dependency count per task above which the schedule is penalized
    #[serde(default = "default_fan_in_threshold")]
    pub fan_in_threshold: f64,

    #[serde(default = "default_fan_in_penalty")]
    pub fan_in_penalty: f64,

    /// Buffer as a share of total duration
    #[serde(default = "default_buffer_ratio")]
    pub buffer_ratio: f64,

    /// Added to the buffer ratio for risk-dense and conflict-dense schedules
    #[serde(default = "default_buffer_bonus")]
    pub buffer_bonus: f64,

    /// Slack at or below this many days makes a conflict medium severity
    #[serde(default = "default_low_slack_days")]
    pub low_slack_days: i64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            base_completion_probability: default_base_completion_probability(),
            behind_schedule_penalty: default_behind_schedule_penalty(),
            conflict_penalty: default_conflict_penalty(),
            fan_in_threshold: default_fan_in_threshold(),
            fan_in_penalty: default_fan_in_penalty(),
            buffer_ratio: default_buffer_ratio(),
            buffer_bonus: default_buffer_bonus(),
            low_slack_days: default_low_slack_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ResourceConfig {
    #[serde(default = "default_target_utilization")]
    pub target_utilization: f64,

    #[serde(default = "default_over_allocation")]
    pub over_allocation: f64,

    #[serde(default = "default_under_allocation")]
    pub under_allocation: f64,

    #[serde(default = "default_skill_mismatch_threshold")]
    pub skill_mismatch_threshold: f64,

    /// Minimum skill match for an automatic assignment
    #[serde(default = "default_min_assignment_match")]
    pub min_assignment_match: f64,

    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f64,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            target_utilization: default_target_utilization(),
            over_allocation: default_over_allocation(),
            under_allocation: default_under_allocation(),
            skill_mismatch_threshold: default_skill_mismatch_threshold(),
            min_assignment_match: default_min_assignment_match(),
            hours_per_day: default_hours_per_day(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct BudgetConfig {
    /// Declared rates below this share of the market rate are raised to it
    #[serde(default = "default_market_rate_floor")]
    pub market_rate_floor: f64,

    #[serde(default = "default_contingency_floor")]
    pub contingency_floor: f64,

    #[serde(default = "default_low_efficiency")]
    pub low_efficiency: f64,

    #[serde(default = "default_efficiency_cut")]
    pub efficiency_cut: f64,

    #[serde(default)]
    pub market_rates: MarketRates,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            market_rate_floor: default_market_rate_floor(),
            contingency_floor: default_contingency_floor(),
            low_efficiency: default_low_efficiency(),
            efficiency_cut: default_efficiency_cut(),
            market_rates: MarketRates::default(),
        }
    }
}

/// Hourly market rate per resource type
#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema)]
pub struct MarketRates {
    #[serde(default = "default_human_rate")]
    pub human: f64,

    #[serde(default = "default_equipment_rate")]
    pub equipment: f64,

    #[serde(default = "default_software_rate")]
    pub software: f64,

    #[serde(default = "default_space_rate")]
    pub space: f64,
}

impl Default for MarketRates {
    fn default() -> Self {
        Self {
            human: default_human_rate(),
            equipment: default_equipment_rate(),
            software: default_software_rate(),
            space: default_space_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RiskConfig {
    #[serde(default = "default_simulation_iterations")]
    pub simulation_iterations: usize,

    #[serde(default = "default_simulation_seed")]
    pub simulation_seed: u64,

    /// Weight of the observed realization rate when history is supplied
    #[serde(default = "default_historical_weight")]
    pub historical_weight: f64,

    /// Share of the total budget reserved by the contingency plan
    #[serde(default = "default_reserve_ratio")]
    pub reserve_ratio: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            simulation_iterations: default_simulation_iterations(),
            simulation_seed: default_simulation_seed(),
            historical_weight: default_historical_weight(),
            reserve_ratio: default_reserve_ratio(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct PlanningConfig {
    #[serde(default)]
    pub priority: OptimizationPriority,

    #[serde(default)]
    pub aggressiveness: Aggressiveness,

    /// Ceiling for proposed budget cuts, as a share of the estimate
    #[serde(default = "default_max_budget_reduction")]
    pub max_budget_reduction: f64,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationPriority {
    Time,
    Cost,
    Quality,
    #[default]
    Balanced,
}

impl std::fmt::Display for OptimizationPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizationPriority::Time => write!(f, "time"),
            OptimizationPriority::Cost => write!(f, "cost"),
            OptimizationPriority::Quality => write!(f, "quality"),
            OptimizationPriority::Balanced => write!(f, "balanced"),
        }
    }
}

impl std::str::FromStr for OptimizationPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "time" | "speed" => Ok(OptimizationPriority::Time),
            "cost" | "budget" => Ok(OptimizationPriority::Cost),
            "quality" => Ok(OptimizationPriority::Quality),
            "balanced" => Ok(OptimizationPriority::Balanced),
            _ => Err(format!("Unknown optimization priority: {}", s)),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Aggressiveness {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

impl Aggressiveness {
    pub fn factor(self) -> f64 {
        match self {
            Aggressiveness::Conservative => 0.2,
            Aggressiveness::Balanced => 0.5,
            Aggressiveness::Aggressive => 0.8,
        }
    }
}

impl std::fmt::Display for Aggressiveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggressiveness::Conservative => write!(f, "conservative"),
            Aggressiveness::Balanced => write!(f, "balanced"),
            Aggressiveness::Aggressive => write!(f, "aggressive"),
        }
    }
}

impl std::str::FromStr for Aggressiveness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "conservative" | "low" => Ok(Aggressiveness::Conservative),
            "balanced" | "medium" => Ok(Aggressiveness::Balanced),
            "aggressive" | "high" => Ok(Aggressiveness::Aggressive),
            _ => Err(format!("Unknown aggressiveness: {}", s)),
        }
    }
}
