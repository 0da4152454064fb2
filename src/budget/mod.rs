//! Budget calculator: estimate, tracking, earned value forecast and cuts

mod estimate;
mod forecast;
mod optimize;
mod tracking;

pub use estimate::{
    estimate_budget, BudgetEstimate, BudgetRisk, CostBreakdown, ResourceCost, ThreePointEstimate,
};
pub use forecast::{forecast, EvmForecast, EvmInput};
pub use optimize::{optimize_budget, BudgetOptimization, SavingsCandidate};
pub use tracking::{track_performance, BudgetHealth, BudgetPerformance, CategoryPerformance};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::model::{ProjectSnapshot, ResourceType};
use crate::resource::allocation_views;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAnalysis {
    pub estimate: BudgetEstimate,
    pub performance: BudgetPerformance,
    pub forecast: EvmForecast,
    pub optimization: BudgetOptimization,
    /// Budget the forecast is measured against
    pub baseline: f64,
}

/// Budget at completion: the sponsor's ceiling, else the allocated budget,
/// else the estimate with contingency.
pub fn baseline_budget(snapshot: &ProjectSnapshot, estimate: &BudgetEstimate) -> f64 {
    snapshot
        .project
        .budget
        .filter(|b| *b > 0.0)
        .or_else(|| Some(snapshot.total_allocated()).filter(|b| *b > 0.0))
        .unwrap_or_else(|| estimate.with_contingency())
}

/// Duration-weighted share of completed scope
pub fn scope_progress(snapshot: &ProjectSnapshot, hours_per_day: f64) -> f64 {
    let (done, total) = snapshot.tasks.iter().fold((0.0, 0.0), |(done, total), t| {
        let days = t.duration_days(hours_per_day) as f64;
        (done + days * t.effective_progress(), total + days)
    });
    if total > 0.0 {
        done / total
    } else {
        0.0
    }
}

/// Planned duration when no schedule is at hand: the target window when set,
/// else the total work spread across the human resources.
pub fn nominal_duration(snapshot: &ProjectSnapshot, hours_per_day: f64) -> i64 {
    if let Some(end) = snapshot.project.target_end_date {
        return (end - snapshot.project.start_date).num_days().max(0);
    }
    let work: i64 = snapshot
        .tasks
        .iter()
        .map(|t| t.duration_days(hours_per_day))
        .sum();
    let people = snapshot
        .resources
        .iter()
        .filter(|r| r.kind == ResourceType::Human)
        .count()
        .max(1) as i64;
    (work + people - 1) / people
}

/// Earned value forecast over a planned duration of `total_days`
pub fn forecast_for(
    snapshot: &ProjectSnapshot,
    baseline: f64,
    actual_cost: f64,
    total_days: i64,
    config: &Config,
) -> EvmForecast {
    let as_of = snapshot.as_of();
    let elapsed = (as_of - snapshot.project.start_date).num_days();
    let planned_progress = if total_days > 0 {
        (elapsed as f64 / total_days as f64).clamp(0.0, 1.0)
    } else {
        1.0
    };

    forecast(&EvmInput {
        budget: baseline,
        progress: scope_progress(snapshot, config.resources.hours_per_day),
        planned_progress,
        actual_cost,
        total_days,
        as_of,
    })
}

pub fn analyze_budget(snapshot: &ProjectSnapshot, config: &Config) -> BudgetAnalysis {
    let hours_per_day = config.resources.hours_per_day;
    let allocations = allocation_views(
        &snapshot.resources,
        &snapshot.tasks,
        &snapshot.assignments,
        hours_per_day,
    );

    let estimate = estimate_budget(
        &snapshot.project,
        &snapshot.tasks,
        &snapshot.resources,
        &allocations,
        &config.budget,
        &config.resources,
    );
    let performance = track_performance(
        &snapshot.budgets,
        &snapshot.expenses,
        snapshot.project.start_date,
        snapshot.as_of(),
    );
    let baseline = baseline_budget(snapshot, &estimate);
    let forecast = forecast_for(
        snapshot,
        baseline,
        performance.total_spent,
        nominal_duration(snapshot, hours_per_day),
        config,
    );
    let optimization = optimize_budget(
        &estimate,
        &snapshot.resources,
        config.planning.max_budget_reduction,
        &config.budget,
    );

    info!(
        "Budget: estimate {:.2}, baseline {:.2}, spent {:.2} ({}), CPI {:.2}",
        estimate.total_estimated_cost,
        baseline,
        performance.total_spent,
        performance.health,
        forecast.cpi
    );

    BudgetAnalysis {
        estimate,
        performance,
        forecast,
        optimization,
        baseline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BudgetCategory, Project, Resource, Task, TaskStatus};
    use chrono::NaiveDate;

    fn snapshot() -> ProjectSnapshot {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut snap = ProjectSnapshot::new(Project::new("p", "Billing", start));
        snap.tasks = vec![
            {
                let mut t = Task::new("a", "Schema").with_days(4.0).assigned_to("dev");
                t.status = TaskStatus::Completed;
                t
            },
            Task::new("b", "API").with_days(6.0).assigned_to("dev"),
        ];
        snap.resources = vec![Resource::new("dev", "Dev", ResourceType::Human).with_rate(100.0)];
        snap.budgets = vec![BudgetCategory::new("Personnel", 10_000.0, 8_000.0)];
        snap.as_of = Some(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
        snap
    }

    #[test]
    fn test_scope_progress_weighted_by_duration() {
        assert!((scope_progress(&snapshot(), 8.0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_analysis_uses_allocated_budget_as_baseline() {
        let analysis = analyze_budget(&snapshot(), &Config::default());
        assert_eq!(analysis.baseline, 10_000.0);
        assert_eq!(analysis.performance.variance, -2_000.0);
        assert!((analysis.forecast.earned_value - 4_000.0).abs() < 1e-6);
        assert_eq!(analysis.forecast.actual_cost, 8_000.0);
        assert!(analysis.forecast.cpi < 1.0);
    }

    #[test]
    fn test_nominal_duration_spreads_work() {
        let mut snap = snapshot();
        assert_eq!(nominal_duration(&snap, 8.0), 10);
        snap.resources
            .push(Resource::new("dev2", "Dev 2", ResourceType::Human));
        assert_eq!(nominal_duration(&snap, 8.0), 5);
        snap.project.target_end_date = Some(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        assert_eq!(nominal_duration(&snap, 8.0), 30);
    }
}
