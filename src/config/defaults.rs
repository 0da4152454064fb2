use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

pub fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

pub fn default_deadline_sec() -> u64 {
    30
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_backoff_base_ms() -> u64 {
    250
}

// Timeline

pub fn default_base_completion_probability() -> f64 {
    0.85
}

pub fn default_behind_schedule_penalty() -> f64 {
    0.05
}

pub fn default_conflict_penalty() -> f64 {
    0.03
}

pub fn default_fan_in_threshold() -> f64 {
    2.0
}

pub fn default_fan_in_penalty() -> f64 {
    0.10
}

pub fn default_buffer_ratio() -> f64 {
    0.15
}

pub fn default_buffer_bonus() -> f64 {
    0.05
}

pub fn default_low_slack_days() -> i64 {
    2
}

// Resources

pub fn default_target_utilization() -> f64 {
    85.0
}

pub fn default_over_allocation() -> f64 {
    100.0
}

pub fn default_under_allocation() -> f64 {
    70.0
}

pub fn default_skill_mismatch_threshold() -> f64 {
    0.7
}

pub fn default_min_assignment_match() -> f64 {
    0.5
}

pub fn default_hours_per_day() -> f64 {
    8.0
}

// Budget

pub fn default_market_rate_floor() -> f64 {
    0.8
}

pub fn default_contingency_floor() -> f64 {
    0.10
}

pub fn default_low_efficiency() -> f64 {
    0.8
}

pub fn default_efficiency_cut() -> f64 {
    0.15
}

pub fn default_human_rate() -> f64 {
    75.0
}

pub fn default_equipment_rate() -> f64 {
    25.0
}

pub fn default_software_rate() -> f64 {
    15.0
}

pub fn default_space_rate() -> f64 {
    20.0
}

// Risk

pub fn default_simulation_iterations() -> usize {
    1000
}

pub fn default_simulation_seed() -> u64 {
    42
}

pub fn default_historical_weight() -> f64 {
    0.3
}

pub fn default_reserve_ratio() -> f64 {
    0.10
}

// Planning

pub fn default_max_budget_reduction() -> f64 {
    0.10
}
