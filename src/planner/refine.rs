use tracing::debug;

use crate::model::{ProjectSnapshot, ResourceAssignment};
use crate::resource::AllocationPlan;

/// Snapshot as it would look with the optimizer's proposals carried out.
/// Reallocated points come off the donor's largest assignments first and move
/// to the receiver on the same task and window. Proposed assignments for
/// unstaffed tasks are recorded on the task.
pub fn apply_allocation(snapshot: &ProjectSnapshot, plan: &AllocationPlan) -> ProjectSnapshot {
    let mut next = snapshot.clone();

    for realloc in &plan.reallocations {
        let mut donor: Vec<usize> = next
            .assignments
            .iter()
            .enumerate()
            .filter(|(_, a)| a.resource_id == realloc.from && a.allocation_percent > 0.0)
            .map(|(i, _)| i)
            .collect();
        donor.sort_by(|&a, &b| {
            next.assignments[b]
                .allocation_percent
                .total_cmp(&next.assignments[a].allocation_percent)
        });

        let mut remaining = realloc.amount;
        let mut moved = Vec::new();
        for i in donor {
            if remaining <= 0.0 {
                break;
            }
            let assignment = &mut next.assignments[i];
            let before = assignment.allocation_percent;
            let take = remaining.min(before);
            assignment.allocation_percent -= take;
            if let Some(hours) = assignment.hours.as_mut() {
                *hours *= assignment.allocation_percent / before;
            }
            remaining -= take;

            moved.push(ResourceAssignment {
                resource_id: realloc.to.clone(),
                task_id: assignment.task_id.clone(),
                allocation_percent: take,
                hours: None,
                window: assignment.window,
                priority: assignment.priority,
            });
        }
        if remaining > 0.0 {
            debug!(
                "{:.1}% of {}'s reallocation has no explicit assignment to move",
                remaining, realloc.from
            );
        }
        next.assignments.extend(moved);
    }
    next.assignments.retain(|a| a.allocation_percent > 0.0);

    for proposal in &plan.assignments {
        if let Some(task) = next.tasks.iter_mut().find(|t| t.id == proposal.task_id) {
            if !task.assigned_resources.contains(&proposal.resource_id) {
                task.assigned_resources.push(proposal.resource_id.clone());
            }
        }
    }

    next
}
