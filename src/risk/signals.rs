//! Project measurements the risk rules and monitoring indicators read

use std::collections::{BTreeMap, HashSet};

use crate::budget::{baseline_budget, estimate_budget, nominal_duration, scope_progress};
use crate::config::Config;
use crate::model::{Complexity, ProjectSnapshot, ResourceType, TaskPriority, TaskStatus};
use crate::resource::{allocation_views, ResourceAllocation};

#[derive(Debug, Clone)]
pub struct RiskSignals {
    pub spend_ratio: f64,
    pub total_spent: f64,
    pub baseline_budget: f64,
    /// Bottom-up cost estimate without contingency
    pub estimated_cost: f64,
    pub progress: f64,
    pub planned_progress: f64,
    pub total_days: i64,
    /// EV / PV
    pub schedule_performance: f64,
    /// EV / AC
    pub cost_performance: f64,
    pub allocations: Vec<ResourceAllocation>,
    pub high_priority_share: f64,
    /// Share of human resources whose availability ended before the as-of date
    pub turnover: f64,
    /// Human resource carrying the largest share of open tasks
    pub busiest: Option<(String, f64)>,
    pub open_tasks: usize,
    /// Departed human resources that still hold open tasks
    pub lost_resources: Vec<String>,
    /// Blocked tasks that are critical priority or of high complexity
    pub technical_blockers: Vec<String>,
}

impl RiskSignals {
    pub fn collect(snapshot: &ProjectSnapshot, config: &Config) -> Self {
        let hours_per_day = config.resources.hours_per_day;
        let as_of = snapshot.as_of();

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

        let allocated = snapshot.total_allocated();
        let total_spent = snapshot.total_spent();
        let spend_ratio = if allocated > 0.0 {
            total_spent / allocated
        } else {
            0.0
        };
        let baseline = baseline_budget(snapshot, &estimate);

        let progress = scope_progress(snapshot, hours_per_day);
        let total_days = nominal_duration(snapshot, hours_per_day);
        let elapsed = (as_of - snapshot.project.start_date).num_days();
        let planned_progress = if total_days > 0 {
            (elapsed as f64 / total_days as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let schedule_performance = if planned_progress > 0.0 {
            progress / planned_progress
        } else {
            1.0
        };
        let earned = baseline * progress;
        let cost_performance = if total_spent > 0.0 {
            earned / total_spent
        } else {
            1.0
        };

        let tasks = &snapshot.tasks;
        let high_priority_share = if tasks.is_empty() {
            0.0
        } else {
            tasks.iter().filter(|t| t.is_high_priority()).count() as f64 / tasks.len() as f64
        };

        let humans: Vec<_> = snapshot
            .resources
            .iter()
            .filter(|r| r.kind == ResourceType::Human)
            .collect();
        let departed: HashSet<&str> = humans
            .iter()
            .filter(|r| r.availability.map(|w| w.end < as_of).unwrap_or(false))
            .map(|r| r.id.as_str())
            .collect();
        let turnover = if humans.is_empty() {
            0.0
        } else {
            departed.len() as f64 / humans.len() as f64
        };

        let open: HashSet<&str> = tasks
            .iter()
            .filter(|t| t.status.is_open())
            .map(|t| t.id.as_str())
            .collect();
        let mut holders: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
        for task in tasks.iter().filter(|t| open.contains(t.id.as_str())) {
            for resource in &task.assigned_resources {
                holders
                    .entry(resource.as_str())
                    .or_default()
                    .insert(task.id.as_str());
            }
        }
        for a in snapshot
            .assignments
            .iter()
            .filter(|a| open.contains(a.task_id.as_str()))
        {
            holders
                .entry(a.resource_id.as_str())
                .or_default()
                .insert(a.task_id.as_str());
        }

        let busiest = humans
            .iter()
            .filter_map(|r| {
                let held = holders.get(r.id.as_str())?.len();
                Some((r.name.clone(), held as f64 / open.len().max(1) as f64))
            })
            .max_by(|a, b| a.1.total_cmp(&b.1));

        let lost_resources = humans
            .iter()
            .filter(|r| departed.contains(r.id.as_str()))
            .filter(|r| holders.contains_key(r.id.as_str()))
            .map(|r| r.name.clone())
            .collect();

        let technical_blockers = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Blocked)
            .filter(|t| t.priority == TaskPriority::Critical || t.complexity >= Complexity::Complex)
            .map(|t| t.id.clone())
            .collect();

        Self {
            spend_ratio,
            total_spent,
            baseline_budget: baseline,
            estimated_cost: estimate.total_estimated_cost,
            progress,
            planned_progress,
            total_days,
            schedule_performance,
            cost_performance,
            allocations,
            high_priority_share,
            turnover,
            busiest,
            open_tasks: open.len(),
            lost_resources,
            technical_blockers,
        }
    }

    pub fn over_allocated(&self) -> impl Iterator<Item = &ResourceAllocation> {
        self.allocations.iter().filter(|a| a.utilization > 100.0)
    }

    pub fn peak_utilization(&self) -> f64 {
        self.allocations
            .iter()
            .map(|a| a.utilization)
            .fold(0.0, f64::max)
    }

    /// Days the completed scope trails the plan
    pub fn schedule_slip_days(&self) -> f64 {
        ((self.planned_progress - self.progress) * self.total_days as f64).max(0.0)
    }

    pub fn budget_overrun(&self) -> f64 {
        (self.spend_ratio - 1.0).max(0.0)
    }
}
