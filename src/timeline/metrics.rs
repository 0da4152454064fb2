use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::TimelineConfig;
use crate::model::{Complexity, Task};

use super::graph::TaskNode;

/// Behind by more than this share of the work counts as behind schedule
const BEHIND_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleVariance {
    pub started_tasks: usize,
    pub planned_progress: f64,
    pub actual_progress: f64,
    /// actual - planned; negative means behind
    pub variance: f64,
    pub behind_schedule: Vec<String>,
}

/// Compare planned progress-to-date with reported progress for started tasks
pub fn schedule_variance(nodes: &[TaskNode], tasks: &[Task], as_of: NaiveDate) -> ScheduleVariance {
    let mut planned_sum = 0.0;
    let mut actual_sum = 0.0;
    let mut started = 0;
    let mut behind = Vec::new();

    for node in nodes {
        let Some(task) = tasks.iter().find(|t| t.id == node.task_id) else {
            continue;
        };
        if !task.is_started() {
            continue;
        }

        let elapsed = (as_of - node.scheduled_start).num_days() as f64;
        let planned = (elapsed / node.duration as f64).clamp(0.0, 1.0);
        let actual = task.effective_progress();

        if actual + BEHIND_TOLERANCE < planned {
            behind.push(node.task_id.clone());
        }

        planned_sum += planned;
        actual_sum += actual;
        started += 1;
    }

    if started == 0 {
        return ScheduleVariance::default();
    }

    let planned_progress = planned_sum / started as f64;
    let actual_progress = actual_sum / started as f64;
    ScheduleVariance {
        started_tasks: started,
        planned_progress,
        actual_progress,
        variance: actual_progress - planned_progress,
        behind_schedule: behind,
    }
}

pub fn completion_probability(
    nodes: &[TaskNode],
    variance: &ScheduleVariance,
    conflict_count: usize,
    edge_count: usize,
    config: &TimelineConfig,
) -> f64 {
    if nodes.is_empty() {
        return config.base_completion_probability;
    }

    let behind_critical = variance
        .behind_schedule
        .iter()
        .filter(|id| nodes.iter().any(|n| &n.task_id == *id && n.is_critical))
        .count();

    let mean_fan_in = edge_count as f64 / nodes.len() as f64;

    let mut probability = config.base_completion_probability
        - config.behind_schedule_penalty * behind_critical as f64
        - config.conflict_penalty * conflict_count as f64;

    if mean_fan_in > config.fan_in_threshold {
        probability -= config.fan_in_penalty;
    }

    probability.clamp(0.05, 0.99)
}

/// Share of tasks that are hard or urgent enough to make the schedule risk-dense
pub fn risk_density(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let dense = tasks
        .iter()
        .filter(|t| t.complexity >= Complexity::Complex || t.is_high_priority())
        .count();
    dense as f64 / tasks.len() as f64
}

pub fn buffer_days(
    total_duration: i64,
    risk_density: f64,
    conflict_count: usize,
    config: &TimelineConfig,
) -> i64 {
    if total_duration <= 0 {
        return 0;
    }
    let mut ratio = config.buffer_ratio;
    if risk_density > 0.3 {
        ratio += config.buffer_bonus;
    }
    if conflict_count > 0 {
        ratio += config.buffer_bonus;
    }
    // absorb float noise from summing the ratios before rounding up
    (total_duration as f64 * ratio - 1e-9).ceil() as i64
}

pub fn optimization_hints(
    nodes: &[TaskNode],
    total_duration: i64,
    conflict_count: usize,
    skipped_dependencies: usize,
) -> Vec<String> {
    let mut hints = Vec::new();
    if nodes.is_empty() {
        return hints;
    }

    let critical = nodes.iter().filter(|n| n.is_critical).count();
    if critical * 2 > nodes.len() && nodes.len() > 2 {
        hints.push(format!(
            "{} of {} tasks are critical; look for work that can run in parallel",
            critical,
            nodes.len()
        ));
    }

    for node in nodes.iter().filter(|n| n.is_critical && n.duration > 10) {
        hints.push(format!(
            "Split critical task '{}' ({} days) into smaller deliverables",
            node.task_id, node.duration
        ));
    }

    let floating: Vec<&str> = nodes
        .iter()
        .filter(|n| total_duration > 0 && n.slack * 4 >= total_duration)
        .map(|n| n.task_id.as_str())
        .collect();
    if !floating.is_empty() {
        hints.push(format!(
            "Tasks with large slack can lend capacity to the critical path: {}",
            floating.join(", ")
        ));
    }

    if conflict_count > 0 {
        hints.push(format!(
            "Resolve {} resource double-booking(s) before they delay the schedule",
            conflict_count
        ));
    }

    if skipped_dependencies > 0 {
        hints.push(format!(
            "{} dependency edge(s) reference unknown tasks and were ignored",
            skipped_dependencies
        ));
    }

    hints
}
