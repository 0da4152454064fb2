mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            data_dir: default_data_dir(),
            report_dir: default_report_dir(),
            deadline_sec: default_deadline_sec(),
            retry: RetryConfig::default(),
            timeline: TimelineConfig::default(),
            resources: ResourceConfig::default(),
            budget: BudgetConfig::default(),
            risk: RiskConfig::default(),
            planning: PlanningConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline_sec == 0 {
            return Err(ConfigError::InvalidValue {
                field: "deadline_sec",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }

        let p = self.timeline.base_completion_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(ConfigError::InvalidValue {
                field: "timeline.base_completion_probability",
                reason: format!("{} is outside [0, 1]", p),
            });
        }

        let r = &self.resources;
        if r.under_allocation >= r.target_utilization || r.target_utilization > r.over_allocation
        {
            return Err(ConfigError::InvalidValue {
                field: "resources",
                reason: format!(
                    "expected under ({}) < target ({}) <= over ({})",
                    r.under_allocation, r.target_utilization, r.over_allocation
                ),
            });
        }

        if r.hours_per_day <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "resources.hours_per_day",
                reason: "must be positive".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.planning.max_budget_reduction) {
            return Err(ConfigError::InvalidValue {
                field: "planning.max_budget_reduction",
                reason: "must be a share between 0 and 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resources.target_utilization, 85.0);
        assert_eq!(config.budget.market_rate_floor, 0.8);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
deadline_sec: 5
planning:
  priority: cost
  aggressiveness: aggressive
budget:
  market_rates:
    human: 90
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.deadline_sec, 5);
        assert_eq!(config.planning.priority, OptimizationPriority::Cost);
        assert_eq!(config.planning.aggressiveness, Aggressiveness::Aggressive);
        assert_eq!(config.budget.market_rates.human, 90.0);
        assert_eq!(config.budget.market_rates.software, 15.0);
        assert_eq!(config.timeline.low_slack_days, 2);
    }

    #[test]
    fn test_validate_rejects_inverted_bands() {
        let mut config = Config::default();
        config.resources.under_allocation = 90.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "resources", .. })
        ));
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!(
            "speed".parse::<OptimizationPriority>().unwrap(),
            OptimizationPriority::Time
        );
        assert!("nope".parse::<OptimizationPriority>().is_err());
    }
}
