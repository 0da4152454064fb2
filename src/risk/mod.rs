//! Risk analyzer: identification, scoring, monitoring, simulation and
//! contingency planning

mod contingency;
mod identify;
mod monitoring;
mod scoring;
mod signals;
mod simulation;
mod types;

pub use contingency::{
    contingency_plan, ContingencyAction, ContingencyPlan, ContingencyTrigger, TriggerKind,
};
pub use identify::{apply_history, default_mitigation, identify_risks};
pub use monitoring::{
    monitor, Alert, Indicator, IndicatorMetric, IndicatorStatus, MonitoringReport,
};
pub use scoring::{overall_score, Band, RiskMatrix, RiskTrend};
pub use signals::RiskSignals;
pub use simulation::{simulate, triangular, Distribution, SimulationInput, SimulationResult};
pub use types::{
    MitigationApproach, MitigationStrategy, Risk, RiskCategory, RiskHistoryRecord, RiskLevel,
    RiskSeverity, RiskStatus,
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::model::ProjectSnapshot;
use crate::timeline::{critical_path_pass, TaskGraph};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_score: f64,
    pub level: RiskLevel,
    /// Highest score first
    pub risks: Vec<Risk>,
    pub matrix: RiskMatrix,
    pub trend: RiskTrend,
    pub recommendations: Vec<String>,
    pub monitoring: MonitoringReport,
    pub contingency_plan: ContingencyPlan,
    /// Absent when the task graph is not a DAG
    pub simulation: Option<SimulationResult>,
}

impl RiskAssessment {
    pub fn by_category(&self, category: RiskCategory) -> impl Iterator<Item = &Risk> {
        self.risks.iter().filter(move |r| r.category == category)
    }
}

fn run_simulation(
    snapshot: &ProjectSnapshot,
    signals: &RiskSignals,
    config: &Config,
) -> Option<SimulationResult> {
    let tasks = &snapshot.tasks;
    let start = snapshot.project.start_date;
    let graph = match TaskGraph::build(tasks, &snapshot.dependencies) {
        Ok(graph) => graph,
        Err(e) => {
            warn!("Skipping simulation: {}", e);
            return None;
        }
    };
    let durations: Vec<i64> = tasks
        .iter()
        .map(|t| t.duration_days(config.resources.hours_per_day))
        .collect();
    let nodes = match critical_path_pass(&graph, tasks, &durations, start) {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!("Skipping simulation: {}", e);
            return None;
        }
    };
    let offsets: Vec<i64> = tasks
        .iter()
        .map(|t| {
            t.start_date
                .map(|d| (d - start).num_days().max(0))
                .unwrap_or(0)
        })
        .collect();

    // the sponsor's deadline, else the nominal finish plus the standard buffer
    let deadline_days = match snapshot.project.target_end_date {
        Some(end) => (end - start).num_days().max(0) as f64,
        None => {
            let finish = nodes.iter().map(|n| n.early_finish).max().unwrap_or(0) as f64;
            finish * (1.0 + config.timeline.buffer_ratio)
        }
    };

    simulate(&SimulationInput {
        tasks,
        graph: &graph,
        durations: &durations,
        offsets: &offsets,
        base_cost: signals.estimated_cost,
        deadline_days,
        budget_limit: signals.baseline_budget,
        iterations: config.risk.simulation_iterations,
        seed: config.risk.simulation_seed,
    })
    .ok()
}

fn recommendations(
    risks: &[Risk],
    level: RiskLevel,
    simulation: Option<&SimulationResult>,
) -> Vec<String> {
    let mut out: Vec<String> = risks
        .iter()
        .filter(|r| r.severity() >= RiskSeverity::High)
        .map(|r| {
            format!(
                "{}: {} (owner: {}, by {})",
                r.title, r.mitigation.description, r.mitigation.owner, r.mitigation.deadline
            )
        })
        .collect();

    if let Some(sim) = simulation {
        if sim.on_time_probability < 0.5 {
            out.push(format!(
                "Only {:.0}% of simulated outcomes finish within {:.0} days; add buffer or reduce scope",
                sim.on_time_probability * 100.0,
                sim.deadline_days
            ));
        }
        if sim.on_budget_probability < 0.5 {
            out.push(format!(
                "Only {:.0}% of simulated outcomes stay within {:.0}; revisit the budget baseline",
                sim.on_budget_probability * 100.0,
                sim.budget_limit
            ));
        }
    }

    match level {
        RiskLevel::Critical => {
            out.push("Escalate to the sponsor: overall risk is critical".to_string())
        }
        RiskLevel::High => out.push("Review risks weekly with the steering group".to_string()),
        RiskLevel::Moderate | RiskLevel::Low if out.is_empty() => {
            out.push("Risk profile is under control; keep the monitoring cadence".to_string())
        }
        _ => {}
    }

    out
}

/// Assess project risk from a full snapshot. Never fails: a cyclic graph only
/// disables the simulation.
pub fn assess_risks(snapshot: &ProjectSnapshot, config: &Config) -> RiskAssessment {
    let signals = RiskSignals::collect(snapshot, config);

    let mut risks = identify_risks(snapshot, &signals);
    if !snapshot.risk_history.is_empty() {
        apply_history(&mut risks, &snapshot.risk_history, config.risk.historical_weight);
    }
    risks.sort_by(|a, b| b.score().total_cmp(&a.score()));

    let overall = overall_score(&risks);
    let level = RiskLevel::from_score(overall);
    let simulation = run_simulation(snapshot, &signals, config);

    let assessment = RiskAssessment {
        overall_score: overall,
        level,
        matrix: RiskMatrix::build(&risks),
        trend: RiskTrend::between(snapshot.previous_risk_score, overall),
        recommendations: recommendations(&risks, level, simulation.as_ref()),
        monitoring: monitor(&signals),
        contingency_plan: contingency_plan(
            &signals,
            signals.baseline_budget,
            config.risk.reserve_ratio,
        ),
        simulation,
        risks,
    };

    info!(
        "Risk assessment: {} risks, overall {:.2} ({}), trend {}",
        assessment.risks.len(),
        assessment.overall_score,
        assessment.level,
        assessment.trend
    );

    assessment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BudgetCategory, Dependency, Project, Task};
    use chrono::NaiveDate;

    fn snapshot() -> ProjectSnapshot {
        let start = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        let mut project = Project::new("p", "Portal", start);
        project.acceptance_criteria = vec!["Ships".into()];
        let mut snap = ProjectSnapshot::new(project);
        snap.tasks = vec![
            Task::new("a", "A").with_days(2.0),
            Task::new("b", "B").with_days(3.0),
        ];
        snap.dependencies = vec![Dependency::new("b", "a")];
        snap.budgets = vec![BudgetCategory::new("Personnel", 10_000.0, 8_000.0)];
        snap.as_of = Some(start);
        snap
    }

    #[test]
    fn test_budget_scenario_flags_budget_risk() {
        let assessment = assess_risks(&snapshot(), &Config::default());
        assert_eq!(assessment.by_category(RiskCategory::Budget).count(), 1);
        // 0.8 * 7 = 5.6
        assert!((assessment.overall_score - 5.6).abs() < 1e-9);
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(assessment.trend, RiskTrend::Stable);
        assert!(assessment.simulation.is_some());
        assert_eq!(assessment.contingency_plan.reserved_budget, 1_000.0);
    }

    #[test]
    fn test_trend_against_previous_score() {
        let mut snap = snapshot();
        snap.previous_risk_score = Some(3.0);
        assert_eq!(
            assess_risks(&snap, &Config::default()).trend,
            RiskTrend::Worsening
        );
    }

    #[test]
    fn test_cycle_disables_simulation_only() {
        let mut snap = snapshot();
        snap.dependencies.push(Dependency::new("a", "b"));
        let assessment = assess_risks(&snap, &Config::default());
        assert!(assessment.simulation.is_none());
        assert_eq!(assessment.risks.len(), 1);
    }

    #[test]
    fn test_history_lowers_probability() {
        let mut snap = snapshot();
        snap.risk_history = vec![RiskHistoryRecord {
            category: RiskCategory::Budget,
            identified: 10,
            realized: 0,
        }];
        let assessment = assess_risks(&snap, &Config::default());
        assert!((assessment.risks[0].probability - 0.56).abs() < 1e-9);
    }
}
