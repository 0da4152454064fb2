//! Resource optimizer: allocation views, conflicts, balancing and staffing

mod assign;
mod balance;
mod resolution;
mod skills;
mod workload;

pub use assign::{assign_unstaffed, rank_candidates, ProposedAssignment, UnassignedTask};
pub use balance::{balance_workload, Reallocation};
pub use resolution::{
    options_for, resolution_score, ConflictKind, CostBasis, ResolutionOption, ResolutionStrategy,
    ResourceConflict,
};
pub use skills::{missing_skills, required_skills, skill_match};
pub use workload::{
    allocation_views, effective_utilization, utilization_variance, ResourceAllocation,
};

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::model::{ProjectSnapshot, ResourceType, TaskPriority};
use crate::timeline::{detect_overlaps, ConflictSeverity, Criticality};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    pub allocations: Vec<ResourceAllocation>,
    pub original_utilization: f64,
    pub optimized_utilization: f64,
    pub reallocations: Vec<Reallocation>,
    pub conflicts: Vec<ResourceConflict>,
    pub assignments: Vec<ProposedAssignment>,
    pub unassigned: Vec<UnassignedTask>,
    pub cost_savings: f64,
    pub timeline_savings_days: f64,
    pub recommendations: Vec<String>,
}

impl AllocationPlan {
    pub fn over_allocated(&self) -> impl Iterator<Item = &ResourceConflict> {
        self.conflicts
            .iter()
            .filter(|c| matches!(c.kind, ConflictKind::OverAllocation { .. }))
    }
}

/// Without a schedule, critical-priority tasks count as critical and
/// high-priority tasks as having no float.
struct PriorityCriticality<'a>(HashMap<&'a str, TaskPriority>);

impl Criticality for PriorityCriticality<'_> {
    fn is_critical(&self, task_id: &str) -> bool {
        self.0.get(task_id) == Some(&TaskPriority::Critical)
    }

    fn slack(&self, task_id: &str) -> Option<i64> {
        match self.0.get(task_id) {
            Some(TaskPriority::High) => Some(0),
            _ => None,
        }
    }
}

pub fn optimize_allocation(snapshot: &ProjectSnapshot, config: &Config) -> AllocationPlan {
    let rc = &config.resources;
    let rates = &config.budget.market_rates;
    let floor = config.budget.market_rate_floor;
    let resources = &snapshot.resources;

    let allocations = allocation_views(
        resources,
        &snapshot.tasks,
        &snapshot.assignments,
        rc.hours_per_day,
    );
    let original: Vec<f64> = allocations.iter().map(|a| a.utilization).collect();

    let mut conflicts = Vec::new();

    // over-allocation
    for (resource, allocation) in resources.iter().zip(&allocations) {
        if allocation.utilization <= rc.over_allocation {
            continue;
        }
        let severity = if allocation.utilization > 150.0 {
            ConflictSeverity::Critical
        } else if allocation.utilization > 125.0 {
            ConflictSeverity::High
        } else {
            ConflictSeverity::Medium
        };
        let kind = ConflictKind::OverAllocation {
            utilization: allocation.utilization,
        };
        let basis = CostBasis {
            rate: resource.effective_rate(rates, floor),
            market_rate: resource.kind.market_rate(rates),
            hours: (allocation.utilization - 100.0) / 100.0 * resource.project_hours(),
        };
        conflicts.push(ResourceConflict {
            resource_id: resource.id.clone(),
            options: options_for(&kind, &basis),
            kind,
            severity,
            description: format!(
                "{} is allocated at {:.0}% of capacity",
                resource.name, allocation.utilization
            ),
        });
    }

    // skill mismatch on existing assignments
    let mut pairs: Vec<(&str, &str)> = snapshot
        .assignments
        .iter()
        .map(|a| (a.resource_id.as_str(), a.task_id.as_str()))
        .chain(snapshot.tasks.iter().flat_map(|t| {
            t.assigned_resources
                .iter()
                .map(move |r| (r.as_str(), t.id.as_str()))
        }))
        .collect();
    let mut seen = HashSet::new();
    pairs.retain(|p| seen.insert(*p));

    for (resource_id, task_id) in pairs {
        let (Some(resource), Some(task)) = (snapshot.resource(resource_id), snapshot.task(task_id))
        else {
            continue;
        };
        if !task.status.is_open() {
            continue;
        }
        let required = required_skills(task);
        let score = skill_match(resource, &required);
        if score >= rc.skill_mismatch_threshold {
            continue;
        }
        let missing = missing_skills(resource, &required);
        let kind = ConflictKind::SkillMismatch {
            task_id: task.id.clone(),
            score,
            missing: missing.clone(),
        };
        let basis = CostBasis {
            rate: resource.effective_rate(rates, floor),
            market_rate: resource.kind.market_rate(rates),
            hours: task.duration_days(rc.hours_per_day) as f64 * rc.hours_per_day,
        };
        conflicts.push(ResourceConflict {
            resource_id: resource.id.clone(),
            options: options_for(&kind, &basis),
            kind,
            severity: if score < 0.3 {
                ConflictSeverity::High
            } else {
                ConflictSeverity::Medium
            },
            description: format!(
                "{} covers {:.0}% of the skills for '{}' (missing: {})",
                resource.name,
                score * 100.0,
                task.title,
                missing.join(", ")
            ),
        });
    }

    // double booking
    let lookup = PriorityCriticality(
        snapshot
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.priority))
            .collect(),
    );
    for overlap in detect_overlaps(&snapshot.assignments, &lookup, 0) {
        let Some(resource) = snapshot.resource(&overlap.resource_id) else {
            continue;
        };
        let kind = ConflictKind::DoubleBooking {
            first_task: overlap.first_task.clone(),
            second_task: overlap.second_task.clone(),
        };
        let basis = CostBasis {
            rate: resource.effective_rate(rates, floor),
            market_rate: resource.kind.market_rate(rates),
            hours: overlap.overlap.days() as f64 * rc.hours_per_day,
        };
        conflicts.push(ResourceConflict {
            resource_id: resource.id.clone(),
            options: options_for(&kind, &basis),
            kind,
            severity: overlap.severity,
            description: format!(
                "{} is booked on '{}' and '{}' from {} to {} ({:.0}% combined)",
                resource.name,
                overlap.first_task,
                overlap.second_task,
                overlap.overlap.start,
                overlap.overlap.end,
                overlap.combined_allocation
            ),
        });
    }

    conflicts.sort_by(|a, b| b.severity.cmp(&a.severity));

    let mut utilization = original.clone();
    let reallocations = balance_workload(resources, &mut utilization, rc);

    let staffed: HashSet<&str> = snapshot
        .assignments
        .iter()
        .map(|a| a.task_id.as_str())
        .collect();
    let unstaffed: Vec<_> = snapshot
        .tasks
        .iter()
        .filter(|t| t.status.is_open())
        .filter(|t| t.assigned_resources.is_empty() && !staffed.contains(t.id.as_str()))
        .collect();
    let (assignments, unassigned) =
        assign_unstaffed(&unstaffed, resources, &mut utilization, rc, rates, floor);

    let mut cost_savings = 0.0;
    let mut timeline_savings_days = 0.0;
    for realloc in &reallocations {
        let (Some(from), Some(to)) = (snapshot.resource(&realloc.from), snapshot.resource(&realloc.to))
        else {
            continue;
        };
        // overloaded hours are paid at an overtime premium of 50%
        let overtime_rate = from.effective_rate(rates, floor) * 1.5;
        let moved_rate = to.effective_rate(rates, floor);
        cost_savings += (realloc.hours * (overtime_rate - moved_rate)).max(0.0);
        timeline_savings_days += realloc.hours / rc.hours_per_day;
    }

    let original_utilization = effective_utilization(&original);
    let optimized_utilization = effective_utilization(&utilization);

    let recommendations = recommendations(
        &allocations,
        &utilization,
        &conflicts,
        &unassigned,
        resources.iter().filter(|r| r.kind == ResourceType::Human).count(),
        rc.under_allocation,
    );

    info!(
        "Resource optimization: {} conflicts, {} reallocations, {} assignments, utilization {:.1}% -> {:.1}%",
        conflicts.len(),
        reallocations.len(),
        assignments.len(),
        original_utilization,
        optimized_utilization
    );

    AllocationPlan {
        allocations,
        original_utilization,
        optimized_utilization,
        reallocations,
        conflicts,
        assignments,
        unassigned,
        cost_savings,
        timeline_savings_days,
        recommendations,
    }
}

fn recommendations(
    allocations: &[ResourceAllocation],
    balanced: &[f64],
    conflicts: &[ResourceConflict],
    unassigned: &[UnassignedTask],
    human_count: usize,
    under_allocation: f64,
) -> Vec<String> {
    let mut out = Vec::new();

    for conflict in conflicts
        .iter()
        .filter(|c| c.severity >= ConflictSeverity::High)
    {
        if let Some(best) = conflict.best_option() {
            out.push(format!(
                "{}: {} ({})",
                conflict.description, best.strategy, best.description
            ));
        }
    }

    let still_over: Vec<&str> = allocations
        .iter()
        .zip(balanced)
        .filter(|(_, u)| **u > 100.0)
        .map(|(a, _)| a.name.as_str())
        .collect();
    if !still_over.is_empty() {
        out.push(format!(
            "No compatible capacity left for {}; consider hiring or rescoping",
            still_over.join(", ")
        ));
    }

    let idle: Vec<&str> = allocations
        .iter()
        .zip(balanced)
        .filter(|(_, u)| **u < under_allocation / 2.0)
        .map(|(a, _)| a.name.as_str())
        .collect();
    if !idle.is_empty() {
        out.push(format!("Under-used resources available: {}", idle.join(", ")));
    }

    if !unassigned.is_empty() {
        out.push(format!(
            "{} task(s) could not be staffed automatically",
            unassigned.len()
        ));
    }

    if human_count == 1 {
        out.push("Single-person team: plan cover for absences".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateWindow, Project, Resource, ResourceAssignment, Task};
    use chrono::NaiveDate;

    fn base() -> ProjectSnapshot {
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        ProjectSnapshot::new(Project::new("p", "P", start))
    }

    fn window(from: u32, to: u32) -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 4, from).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, to).unwrap(),
        )
    }

    #[test]
    fn test_over_allocation_balanced_to_peer() {
        let mut snap = base();
        snap.resources = vec![
            Resource::new("a", "Ana", ResourceType::Human)
                .with_rate(100.0)
                .with_skills(&["development"]),
            Resource::new("b", "Ben", ResourceType::Human)
                .with_rate(80.0)
                .with_skills(&["development"]),
        ];
        snap.tasks = vec![
            Task::new("t1", "API"),
            Task::new("t2", "UI"),
            Task::new("t3", "Docs"),
        ];
        snap.assignments = vec![
            ResourceAssignment::new("a", "t1", 70.0, window(1, 5)),
            ResourceAssignment::new("a", "t2", 60.0, window(8, 12)),
            ResourceAssignment::new("b", "t3", 20.0, window(1, 12)),
        ];

        let plan = optimize_allocation(&snap, &Config::default());
        assert_eq!(plan.over_allocated().count(), 1);
        assert_eq!(plan.reallocations.len(), 1);
        assert_eq!(plan.reallocations[0].amount, 45.0);
        assert!(plan.optimized_utilization > plan.original_utilization);
        assert!(plan.cost_savings > 0.0);
        assert!(plan.timeline_savings_days > 0.0);
        // disjoint windows: no double booking
        assert!(!plan
            .conflicts
            .iter()
            .any(|c| matches!(c.kind, ConflictKind::DoubleBooking { .. })));
    }

    #[test]
    fn test_repeated_resource_id_does_not_panic() {
        let mut snap = base();
        snap.resources = vec![
            Resource::new("r", "Rae", ResourceType::Human).with_skills(&["development"]),
            Resource::new("r", "Rae", ResourceType::Human).with_skills(&["development"]),
        ];
        snap.tasks = vec![Task::new("t1", "API"), Task::new("t2", "UI")];
        snap.assignments = vec![
            ResourceAssignment::new("r", "t1", 70.0, window(1, 5)),
            ResourceAssignment::new("r", "t2", 60.0, window(8, 12)),
        ];

        let plan = optimize_allocation(&snap, &Config::default());
        assert_eq!(plan.allocations.len(), 2);
    }

    #[test]
    fn test_double_booking_and_skill_mismatch_reported() {
        let mut snap = base();
        snap.resources =
            vec![Resource::new("r", "Rae", ResourceType::Human).with_skills(&["design"])];
        snap.tasks = vec![
            Task::new("t1", "Backend").with_priority(TaskPriority::Critical),
            Task::new("t2", "Mockups").with_category(crate::model::TaskCategory::Design),
        ];
        snap.assignments = vec![
            ResourceAssignment::new("r", "t1", 70.0, window(1, 10)),
            ResourceAssignment::new("r", "t2", 60.0, window(5, 15)),
        ];

        let plan = optimize_allocation(&snap, &Config::default());
        let booking = plan
            .conflicts
            .iter()
            .find(|c| matches!(c.kind, ConflictKind::DoubleBooking { .. }))
            .unwrap();
        assert_eq!(booking.severity, ConflictSeverity::High);
        assert!(plan.conflicts.iter().any(|c| matches!(
            &c.kind,
            ConflictKind::SkillMismatch { task_id, .. } if task_id == "t1"
        )));
        assert!(plan.conflicts.iter().all(|c| (2..=3).contains(&c.options.len())));
    }

    #[test]
    fn test_unstaffed_task_gets_assigned() {
        let mut snap = base();
        snap.resources = vec![Resource::new("r", "Rae", ResourceType::Human)
            .with_skills(&["testing"])];
        snap.tasks = vec![Task::new("qa", "Regression")
            .with_category(crate::model::TaskCategory::Testing)
            .with_days(2.0)];

        let plan = optimize_allocation(&snap, &Config::default());
        assert_eq!(plan.assignments.len(), 1);
        assert_eq!(plan.assignments[0].resource_id, "r");
        assert!(plan.unassigned.is_empty());
    }
}
