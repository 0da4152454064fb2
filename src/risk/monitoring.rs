//! Traffic-light indicators and the alerts they raise

use serde::{Deserialize, Serialize};

use super::signals::RiskSignals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorStatus {
    Green,
    Yellow,
    Red,
}

impl IndicatorStatus {
    /// `ratio` of the metric to its threshold, oriented so that 1.0 is on target
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 0.9 {
            IndicatorStatus::Green
        } else if ratio >= 0.7 {
            IndicatorStatus::Yellow
        } else {
            IndicatorStatus::Red
        }
    }
}

impl std::fmt::Display for IndicatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorStatus::Green => write!(f, "green"),
            IndicatorStatus::Yellow => write!(f, "yellow"),
            IndicatorStatus::Red => write!(f, "red"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorMetric {
    SchedulePerformance,
    CostPerformance,
    ResourceUtilization,
    TeamTurnover,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub metric: IndicatorMetric,
    pub name: String,
    pub value: f64,
    pub threshold: f64,
    pub ratio: f64,
    pub status: IndicatorStatus,
}

impl Indicator {
    /// Metric where bigger is better
    fn at_least(metric: IndicatorMetric, name: &str, value: f64, threshold: f64) -> Self {
        let ratio = if threshold > 0.0 { value / threshold } else { 1.0 };
        Self::new(metric, name, value, threshold, ratio)
    }

    /// Metric where smaller is better
    fn at_most(metric: IndicatorMetric, name: &str, value: f64, threshold: f64) -> Self {
        let ratio = if value > threshold && value > 0.0 {
            threshold / value
        } else {
            1.0
        };
        Self::new(metric, name, value, threshold, ratio)
    }

    fn new(metric: IndicatorMetric, name: &str, value: f64, threshold: f64, ratio: f64) -> Self {
        Self {
            metric,
            name: name.to_string(),
            value,
            threshold,
            ratio,
            status: IndicatorStatus::from_ratio(ratio),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub metric: IndicatorMetric,
    pub message: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringReport {
    pub indicators: Vec<Indicator>,
    pub alerts: Vec<Alert>,
}

/// Turnover above this share of the team raises an alert regardless of color
pub const TURNOVER_ALERT: f64 = 0.15;

pub fn monitor(signals: &RiskSignals) -> MonitoringReport {
    let indicators = vec![
        Indicator::at_least(
            IndicatorMetric::SchedulePerformance,
            "Schedule performance index",
            signals.schedule_performance,
            1.0,
        ),
        Indicator::at_least(
            IndicatorMetric::CostPerformance,
            "Cost performance index",
            signals.cost_performance,
            1.0,
        ),
        Indicator::at_most(
            IndicatorMetric::ResourceUtilization,
            "Peak resource utilization",
            signals.peak_utilization(),
            100.0,
        ),
        Indicator::at_most(
            IndicatorMetric::TeamTurnover,
            "Team turnover",
            signals.turnover,
            TURNOVER_ALERT,
        ),
    ];

    let mut alerts = Vec::new();
    for indicator in &indicators {
        let raise = match indicator.metric {
            IndicatorMetric::SchedulePerformance | IndicatorMetric::CostPerformance => {
                indicator.status == IndicatorStatus::Red
            }
            IndicatorMetric::TeamTurnover => indicator.value > TURNOVER_ALERT,
            IndicatorMetric::ResourceUtilization => false,
        };
        if !raise {
            continue;
        }
        let actions: &[&str] = match indicator.metric {
            IndicatorMetric::SchedulePerformance => &[
                "Review the critical path for slipping tasks",
                "Fast-track or crash critical activities",
                "Re-baseline milestones with stakeholders",
            ],
            IndicatorMetric::CostPerformance => &[
                "Audit recent spend against the estimate",
                "Freeze non-essential purchases",
                "Re-forecast the estimate at completion",
            ],
            _ => &[
                "Run knowledge-transfer sessions for departing members",
                "Open backfill requisitions",
                "Document ownership of in-flight tasks",
            ],
        };
        alerts.push(Alert {
            metric: indicator.metric,
            message: format!(
                "{} at {:.2} against a threshold of {:.2}",
                indicator.name, indicator.value, indicator.threshold
            ),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        });
    }

    MonitoringReport { indicators, alerts }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(spi: f64, cpi: f64, turnover: f64) -> RiskSignals {
        RiskSignals {
            spend_ratio: 0.0,
            total_spent: 0.0,
            baseline_budget: 0.0,
            estimated_cost: 0.0,
            progress: 0.0,
            planned_progress: 0.0,
            total_days: 0,
            schedule_performance: spi,
            cost_performance: cpi,
            allocations: Vec::new(),
            high_priority_share: 0.0,
            turnover,
            busiest: None,
            open_tasks: 0,
            lost_resources: Vec::new(),
            technical_blockers: Vec::new(),
        }
    }

    #[test]
    fn test_status_bands() {
        assert_eq!(IndicatorStatus::from_ratio(0.95), IndicatorStatus::Green);
        assert_eq!(IndicatorStatus::from_ratio(0.9), IndicatorStatus::Green);
        assert_eq!(IndicatorStatus::from_ratio(0.75), IndicatorStatus::Yellow);
        assert_eq!(IndicatorStatus::from_ratio(0.5), IndicatorStatus::Red);
    }

    #[test]
    fn test_healthy_project_raises_nothing() {
        let report = monitor(&signals(1.0, 1.1, 0.0));
        assert!(report
            .indicators
            .iter()
            .all(|i| i.status == IndicatorStatus::Green));
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_red_cost_and_turnover_alert() {
        let report = monitor(&signals(0.8, 0.5, 0.25));
        let metrics: Vec<IndicatorMetric> = report.alerts.iter().map(|a| a.metric).collect();
        assert_eq!(
            metrics,
            vec![IndicatorMetric::CostPerformance, IndicatorMetric::TeamTurnover]
        );
        // schedule at 0.8 is yellow, not red
        assert_eq!(report.indicators[0].status, IndicatorStatus::Yellow);
        assert!(report.alerts.iter().all(|a| !a.actions.is_empty()));
    }
}
