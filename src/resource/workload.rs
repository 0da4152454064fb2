//! Derived per-resource workload. Utilization is never stored on a resource;
//! it is recomputed from assignments on every pass.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{Resource, ResourceAssignment, Task};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub resource_id: String,
    pub name: String,
    pub capacity_hours: f64,
    pub allocated_percent: f64,
    /// Sum of assignment shares, in percent of the project hours
    pub utilization: f64,
    pub allocated_hours: f64,
    pub task_ids: Vec<String>,
}

/// Build allocation views from explicit assignment records plus tasks that
/// name a resource without a matching record. Such implicit assignments
/// split the task's hours across its listed resources.
pub fn allocation_views(
    resources: &[Resource],
    tasks: &[Task],
    assignments: &[ResourceAssignment],
    hours_per_day: f64,
) -> Vec<ResourceAllocation> {
    let mut views: Vec<ResourceAllocation> = resources
        .iter()
        .map(|r| ResourceAllocation {
            resource_id: r.id.clone(),
            name: r.name.clone(),
            capacity_hours: r.capacity_hours,
            allocated_percent: r.allocation_percent,
            utilization: 0.0,
            allocated_hours: 0.0,
            task_ids: Vec::new(),
        })
        .collect();
    // first resource wins for a repeated id; views stay aligned with `resources`
    let position = |id: &str| resources.iter().position(|r| r.id == id);

    let mut explicit: HashSet<(&str, &str)> = HashSet::new();
    for assignment in assignments {
        let Some(i) = position(&assignment.resource_id) else {
            tracing::warn!(
                "Assignment of task {} references unknown resource {}",
                assignment.task_id,
                assignment.resource_id
            );
            continue;
        };
        explicit.insert((assignment.resource_id.as_str(), assignment.task_id.as_str()));
        let view = &mut views[i];
        view.utilization += assignment.allocation_percent;
        view.allocated_hours += assignment.allocated_hours(&resources[i]);
        view.task_ids.push(assignment.task_id.clone());
    }

    for task in tasks.iter().filter(|t| t.status.is_open()) {
        let share = task.assigned_resources.len().max(1) as f64;
        let hours = task.duration_days(hours_per_day) as f64 * hours_per_day / share;
        for resource_id in &task.assigned_resources {
            if explicit.contains(&(resource_id.as_str(), task.id.as_str())) {
                continue;
            }
            let Some(i) = position(resource_id) else {
                continue;
            };
            let project_hours = resources[i].project_hours();
            let view = &mut views[i];
            if project_hours > 0.0 {
                view.utilization += hours / project_hours * 100.0;
            }
            view.allocated_hours += hours;
            view.task_ids.push(task.id.clone());
        }
    }

    views
}

/// Mean of per-resource utilization capped at 100 %; work beyond capacity
/// does not count as useful utilization.
pub fn effective_utilization(utilizations: &[f64]) -> f64 {
    if utilizations.is_empty() {
        return 0.0;
    }
    utilizations.iter().map(|u| u.min(100.0)).sum::<f64>() / utilizations.len() as f64
}

pub fn utilization_variance(utilizations: &[f64]) -> f64 {
    if utilizations.is_empty() {
        return 0.0;
    }
    let n = utilizations.len() as f64;
    let mean = utilizations.iter().sum::<f64>() / n;
    utilizations.iter().map(|u| (u - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DateWindow, ResourceType};
    use chrono::NaiveDate;

    fn window() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap(),
        )
    }

    #[test]
    fn test_explicit_assignments_sum() {
        let resources = vec![Resource::new("r", "Dev", ResourceType::Human)];
        let assignments = vec![
            ResourceAssignment::new("r", "t1", 70.0, window()),
            ResourceAssignment::new("r", "t2", 60.0, window()),
        ];
        let views = allocation_views(&resources, &[], &assignments, 8.0);
        assert_eq!(views[0].utilization, 130.0);
        assert_eq!(views[0].task_ids, vec!["t1", "t2"]);
        // 160h capacity at 100% allocation
        assert_eq!(views[0].allocated_hours, 208.0);
    }

    #[test]
    fn test_implicit_assignment_from_task() {
        let resources = vec![Resource::new("r", "Dev", ResourceType::Human).with_capacity(80.0)];
        let tasks = vec![Task::new("t", "T").with_days(5.0).assigned_to("r")];
        let views = allocation_views(&resources, &tasks, &[], 8.0);
        assert_eq!(views[0].allocated_hours, 40.0);
        assert_eq!(views[0].utilization, 50.0);
    }

    #[test]
    fn test_repeated_id_keeps_views_aligned() {
        let resources = vec![
            Resource::new("r", "Dev", ResourceType::Human),
            Resource::new("r", "Dev again", ResourceType::Human),
        ];
        let assignments = vec![ResourceAssignment::new("r", "t1", 70.0, window())];
        let views = allocation_views(&resources, &[], &assignments, 8.0);
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].utilization, 70.0);
        assert_eq!(views[1].utilization, 0.0);
    }

    #[test]
    fn test_effective_utilization_caps_overload() {
        assert_eq!(effective_utilization(&[150.0, 50.0]), 75.0);
        assert_eq!(effective_utilization(&[]), 0.0);
    }
}
