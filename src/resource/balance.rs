use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ResourceConfig;
use crate::model::Resource;

/// A proposed shift of workload between two resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reallocation {
    pub from: String,
    pub to: String,
    /// Percentage points of utilization moved
    pub amount: f64,
    pub hours: f64,
    pub rationale: String,
}

/// Move workload from over-allocated to under-allocated resources that share
/// a skill or a type. Each transfer stops at the target band on both sides,
/// so the donor never ends below the receiver and utilization variance can
/// only shrink. `utilization` is indexed like `resources` and is updated in
/// place.
pub fn balance_workload(
    resources: &[Resource],
    utilization: &mut [f64],
    config: &ResourceConfig,
) -> Vec<Reallocation> {
    let target = config.target_utilization;
    let mut reallocations = Vec::new();

    let mut donors: Vec<usize> = (0..resources.len())
        .filter(|&i| utilization[i] > config.over_allocation)
        .collect();
    donors.sort_by(|&a, &b| utilization[b].total_cmp(&utilization[a]));

    for donor in donors {
        let mut receivers: Vec<usize> = (0..resources.len())
            .filter(|&i| i != donor && utilization[i] < config.under_allocation)
            .filter(|&i| {
                resources[i].kind == resources[donor].kind
                    || resources[i].shares_skill_with(&resources[donor])
            })
            .collect();
        receivers.sort_by(|&a, &b| utilization[a].total_cmp(&utilization[b]));

        for receiver in receivers {
            let give = utilization[donor] - target;
            let take = target - utilization[receiver];
            // floor to a tenth so rounding never overshoots either bound
            let amount = (give.min(take) * 10.0).floor() / 10.0;
            if amount <= 0.0 {
                continue;
            }

            utilization[donor] -= amount;
            utilization[receiver] += amount;

            let from = &resources[donor];
            let to = &resources[receiver];
            let reason = if from.shares_skill_with(to) {
                "shared skills"
            } else {
                "same resource type"
            };
            debug!("Reallocating {:.1}% from {} to {}", amount, from.id, to.id);

            reallocations.push(Reallocation {
                from: from.id.clone(),
                to: to.id.clone(),
                amount,
                hours: amount / 100.0 * from.project_hours(),
                rationale: format!(
                    "Move {:.1}% of {}'s workload to {} ({}), bringing {} to {:.1}% and {} to {:.1}%",
                    amount,
                    from.name,
                    to.name,
                    reason,
                    from.name,
                    utilization[donor],
                    to.name,
                    utilization[receiver]
                ),
            });

            if utilization[donor] <= target {
                break;
            }
        }
    }

    reallocations
}
