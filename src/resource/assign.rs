use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{MarketRates, ResourceConfig};
use crate::model::{Resource, Task};

use super::skills::{required_skills, skill_match};

const SKILL_WEIGHT: f64 = 0.4;
const AVAILABILITY_WEIGHT: f64 = 0.3;
const COST_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAssignment {
    pub task_id: String,
    pub resource_id: String,
    pub score: f64,
    pub skill_match: f64,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnassignedTask {
    pub task_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub resource_index: usize,
    pub score: f64,
    pub skill_match: f64,
}

/// Rank resources for a task by skill match, remaining availability and
/// inverse cost. Best first.
pub fn rank_candidates(
    task: &Task,
    resources: &[Resource],
    utilization: &[f64],
    rates: &MarketRates,
    rate_floor: f64,
) -> Vec<Candidate> {
    let required = required_skills(task);
    let effective: Vec<f64> = resources
        .iter()
        .map(|r| r.effective_rate(rates, rate_floor))
        .collect();
    let cheapest = effective
        .iter()
        .copied()
        .filter(|r| *r > 0.0)
        .fold(f64::INFINITY, f64::min);

    let mut candidates: Vec<Candidate> = resources
        .iter()
        .enumerate()
        .filter(|(_, r)| r.project_hours() > 0.0)
        .map(|(i, r)| {
            let skill = skill_match(r, &required);
            let availability = ((100.0 - utilization[i]) / 100.0).clamp(0.0, 1.0);
            let inverse_cost = if effective[i] > 0.0 && cheapest.is_finite() {
                cheapest / effective[i]
            } else {
                1.0
            };
            Candidate {
                resource_index: i,
                score: SKILL_WEIGHT * skill
                    + AVAILABILITY_WEIGHT * availability
                    + COST_WEIGHT * inverse_cost,
                skill_match: skill,
            }
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

/// Assign open tasks that have no resource. Tasks are visited by priority so
/// urgent work claims capacity first; `utilization` is updated as capacity is
/// consumed.
pub fn assign_unstaffed(
    tasks: &[&Task],
    resources: &[Resource],
    utilization: &mut [f64],
    config: &ResourceConfig,
    rates: &MarketRates,
    rate_floor: f64,
) -> (Vec<ProposedAssignment>, Vec<UnassignedTask>) {
    let mut ordered: Vec<&Task> = tasks.to_vec();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

    let mut assigned = Vec::new();
    let mut unassigned = Vec::new();

    for task in ordered {
        if resources.is_empty() {
            unassigned.push(UnassignedTask {
                task_id: task.id.clone(),
                reason: "no resources in the pool".to_string(),
            });
            continue;
        }

        let hours = task.duration_days(config.hours_per_day) as f64 * config.hours_per_day;
        let candidates = rank_candidates(task, resources, utilization, rates, rate_floor);

        let skilled: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.skill_match >= config.min_assignment_match)
            .collect();
        if skilled.is_empty() {
            unassigned.push(UnassignedTask {
                task_id: task.id.clone(),
                reason: format!(
                    "no resource matches at least {:.0}% of the required skills",
                    config.min_assignment_match * 100.0
                ),
            });
            continue;
        }

        let fit = skilled.into_iter().find(|c| {
            let resource = &resources[c.resource_index];
            let remaining = resource.project_hours()
                * (config.over_allocation - utilization[c.resource_index]).max(0.0)
                / 100.0;
            remaining >= hours
        });

        match fit {
            Some(candidate) => {
                let resource = &resources[candidate.resource_index];
                utilization[candidate.resource_index] += hours / resource.project_hours() * 100.0;
                debug!(
                    "Assigning {} to {} (score {:.2})",
                    task.id, resource.id, candidate.score
                );
                assigned.push(ProposedAssignment {
                    task_id: task.id.clone(),
                    resource_id: resource.id.clone(),
                    score: candidate.score,
                    skill_match: candidate.skill_match,
                    hours,
                });
            }
            None => unassigned.push(UnassignedTask {
                task_id: task.id.clone(),
                reason: format!("no skilled resource has {:.0} free hours", hours),
            }),
        }
    }

    (assigned, unassigned)
}
