//! Timeline engine: critical-path scheduling over the task DAG
//!
//! 1. Build the DAG and derive per-task durations
//! 2. Forward pass (early start/finish) with cycle detection
//! 3. Backward pass (late start/finish, slack)
//! 4. Critical path, variance, completion probability, buffer and hints

mod conflicts;
mod graph;
mod metrics;

pub use conflicts::{detect_overlaps, grade, ConflictSeverity, Criticality, ScheduleConflict};
pub use graph::{critical_path_pass, TaskGraph, TaskNode};
pub use metrics::ScheduleVariance;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ScheduleError;
use crate::model::ProjectSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_duration: i64,
    /// Nodes in topological order
    pub nodes: Vec<TaskNode>,
    pub critical_path: Vec<String>,
    pub schedule_variance: ScheduleVariance,
    pub completion_probability: f64,
    pub buffer_days: i64,
    pub resource_conflicts: Vec<ScheduleConflict>,
    pub optimization_hints: Vec<String>,
}

impl Schedule {
    pub fn node(&self, task_id: &str) -> Option<&TaskNode> {
        self.nodes.iter().find(|n| n.task_id == task_id)
    }

    /// End date including the recommended buffer
    pub fn buffered_end(&self) -> NaiveDate {
        self.end
            .checked_add_days(Days::new(self.buffer_days.max(0) as u64))
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn critical_ratio(&self) -> f64 {
        if self.nodes.is_empty() {
            0.0
        } else {
            self.critical_path.len() as f64 / self.nodes.len() as f64
        }
    }
}

/// Compute the schedule for a full snapshot. Cycles are fatal; nothing partial
/// is returned.
pub fn compute_schedule(
    snapshot: &ProjectSnapshot,
    config: &Config,
) -> Result<Schedule, ScheduleError> {
    let start = snapshot.project.start_date;
    let tasks = &snapshot.tasks;

    let graph = TaskGraph::build(tasks, &snapshot.dependencies)?;
    let durations: Vec<i64> = tasks
        .iter()
        .map(|t| t.duration_days(config.resources.hours_per_day))
        .collect();

    let nodes = critical_path_pass(&graph, tasks, &durations, start)?;
    let total_duration = nodes.iter().map(|n| n.early_finish).max().unwrap_or(0);
    let end = nodes
        .iter()
        .map(|n| n.scheduled_finish)
        .max()
        .unwrap_or(start);

    let mut critical: Vec<&TaskNode> = nodes.iter().filter(|n| n.is_critical).collect();
    // stable sort keeps topological order among equal early starts
    critical.sort_by_key(|n| n.early_start);
    let critical_path: Vec<String> = critical.iter().map(|n| n.task_id.clone()).collect();

    let resource_conflicts = detect_overlaps(
        &snapshot.assignments,
        nodes.as_slice(),
        config.timeline.low_slack_days,
    );

    let variance = metrics::schedule_variance(&nodes, tasks, snapshot.as_of());
    let completion_probability = metrics::completion_probability(
        &nodes,
        &variance,
        resource_conflicts.len(),
        graph.edge_count(),
        &config.timeline,
    );
    let buffer_days = metrics::buffer_days(
        total_duration,
        metrics::risk_density(tasks),
        resource_conflicts.len(),
        &config.timeline,
    );
    let optimization_hints = metrics::optimization_hints(
        &nodes,
        total_duration,
        resource_conflicts.len(),
        graph.skipped().len(),
    );

    debug!("Critical path: {:?}", critical_path);
    info!(
        "Scheduled {} tasks over {} days ({} critical, {} conflicts)",
        nodes.len(),
        total_duration,
        critical_path.len(),
        resource_conflicts.len()
    );

    Ok(Schedule {
        start,
        end,
        total_duration,
        nodes,
        critical_path,
        schedule_variance: variance,
        completion_probability,
        buffer_days,
        resource_conflicts,
        optimization_hints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateWindow, Dependency, Project, ResourceAssignment, Task, MAX_TASK_DAYS};

    fn snapshot(tasks: Vec<Task>, deps: Vec<Dependency>) -> ProjectSnapshot {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut snapshot = ProjectSnapshot::new(Project::new("p", "Planner", start));
        snapshot.tasks = tasks;
        snapshot.dependencies = deps;
        snapshot.as_of = Some(start);
        snapshot
    }

    #[test]
    fn test_linear_chain() {
        let snap = snapshot(
            vec![
                Task::new("A", "A").with_days(2.0),
                Task::new("B", "B").with_days(3.0),
                Task::new("C", "C").with_days(5.0),
            ],
            vec![Dependency::new("B", "A"), Dependency::new("C", "B")],
        );
        let schedule = compute_schedule(&snap, &Config::default()).unwrap();
        assert_eq!(schedule.critical_path, vec!["A", "B", "C"]);
        assert_eq!(schedule.total_duration, 10);
        assert_eq!(schedule.end, snap.project.start_date + chrono::Duration::days(10));
    }

    #[test]
    fn test_parallel_branches_feeding_join() {
        let snap = snapshot(
            vec![
                Task::new("A", "A").with_days(2.0),
                Task::new("B", "B").with_days(3.0),
                Task::new("C", "C").with_days(4.0),
            ],
            vec![Dependency::new("C", "A"), Dependency::new("C", "B")],
        );
        let schedule = compute_schedule(&snap, &Config::default()).unwrap();
        assert_eq!(schedule.critical_path, vec!["B", "C"]);
        assert_eq!(schedule.total_duration, 7);
        assert_eq!(schedule.node("A").unwrap().slack, 1);
    }

    #[test]
    fn test_cycle_returns_error() {
        let snap = snapshot(
            vec![
                Task::new("A", "A").with_days(1.0),
                Task::new("B", "B").with_days(1.0),
            ],
            vec![Dependency::new("A", "B"), Dependency::new("B", "A")],
        );
        let err = compute_schedule(&snap, &Config::default()).unwrap_err();
        assert!(matches!(err, ScheduleError::CircularDependency { .. }));
    }

    #[test]
    fn test_huge_estimate_is_capped_not_fatal() {
        let snap = snapshot(
            vec![
                Task::new("A", "A").with_days(2.0e8),
                Task::new("B", "B").with_days(2.0),
            ],
            vec![Dependency::new("B", "A")],
        );
        let schedule = compute_schedule(&snap, &Config::default()).unwrap();
        assert_eq!(schedule.total_duration, MAX_TASK_DAYS + 2);
        assert!(schedule.buffered_end() >= schedule.end);
    }

    #[test]
    fn test_empty_task_set() {
        let snap = snapshot(vec![], vec![]);
        let schedule = compute_schedule(&snap, &Config::default()).unwrap();
        assert_eq!(schedule.total_duration, 0);
        assert_eq!(schedule.start, schedule.end);
        assert!(schedule.critical_path.is_empty());
        assert_eq!(schedule.buffer_days, 0);
    }

    #[test]
    fn test_conflict_lowers_completion_probability() {
        let mut snap = snapshot(
            vec![
                Task::new("A", "A").with_days(4.0),
                Task::new("B", "B").with_days(2.0),
            ],
            vec![],
        );
        let start = snap.project.start_date;
        let window = DateWindow::new(start, start + chrono::Duration::days(3));
        snap.assignments = vec![
            ResourceAssignment::new("r", "A", 70.0, window),
            ResourceAssignment::new("r", "B", 60.0, window),
        ];
        let schedule = compute_schedule(&snap, &Config::default()).unwrap();
        assert_eq!(schedule.resource_conflicts.len(), 1);
        // A is critical, B is not
        assert_eq!(schedule.resource_conflicts[0].severity, ConflictSeverity::High);
        assert!(schedule.completion_probability < 0.85);
        assert!(schedule
            .optimization_hints
            .iter()
            .any(|h| h.contains("double-booking")));
    }
}
