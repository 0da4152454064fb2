use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BudgetConfig;
use crate::model::{Resource, ResourceType};

use super::estimate::BudgetEstimate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsCandidate {
    pub resource_id: String,
    pub current_cost: f64,
    pub savings: f64,
    /// Delivery risk of the cut, 1 (none) ..= 10 (severe)
    pub risk: f64,
    pub rationale: String,
}

impl SavingsCandidate {
    pub fn ratio(&self) -> f64 {
        self.savings / self.risk
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetOptimization {
    /// Every candidate found, best savings/risk ratio first
    pub candidates: Vec<SavingsCandidate>,
    pub selected: Vec<SavingsCandidate>,
    pub total_savings: f64,
    /// Savings as a share of the estimate
    pub reduction: f64,
    pub max_reduction: f64,
}

/// Cutting people is riskier than cutting tooling, and cutting an efficient
/// resource is riskier than cutting an inefficient one.
fn cut_risk(resource: &Resource, efficiency: f64) -> f64 {
    let base = match resource.kind {
        ResourceType::Human => 5.0,
        ResourceType::Software => 3.0,
        ResourceType::Equipment | ResourceType::Space => 2.0,
    };
    (base + efficiency * 5.0).clamp(1.0, 10.0)
}

/// Propose cuts on resources below the efficiency threshold, greedily by
/// savings/risk ratio while staying under `max_reduction` of the estimate.
pub fn optimize_budget(
    estimate: &BudgetEstimate,
    resources: &[Resource],
    max_reduction: f64,
    config: &BudgetConfig,
) -> BudgetOptimization {
    let mut candidates: Vec<SavingsCandidate> = estimate
        .resource_costs
        .iter()
        .filter_map(|cost| {
            let resource = resources.iter().find(|r| r.id == cost.resource_id)?;
            let efficiency = resource.efficiency?;
            if efficiency >= config.low_efficiency || cost.cost <= 0.0 {
                return None;
            }
            Some(SavingsCandidate {
                resource_id: resource.id.clone(),
                current_cost: cost.cost,
                savings: cost.cost * config.efficiency_cut,
                risk: cut_risk(resource, efficiency),
                rationale: format!(
                    "{} runs at {:.0}% efficiency; trim {:.0}% of its hours",
                    resource.name,
                    efficiency * 100.0,
                    config.efficiency_cut * 100.0
                ),
            })
        })
        .collect();
    candidates.sort_by(|a, b| b.ratio().total_cmp(&a.ratio()));

    let ceiling = estimate.total_estimated_cost * max_reduction;
    let mut selected = Vec::new();
    let mut total_savings = 0.0;
    for candidate in &candidates {
        if total_savings + candidate.savings > ceiling {
            debug!(
                "Skipping cut on {}: would exceed the {:.0}% ceiling",
                candidate.resource_id,
                max_reduction * 100.0
            );
            continue;
        }
        total_savings += candidate.savings;
        selected.push(candidate.clone());
    }

    let reduction = if estimate.total_estimated_cost > 0.0 {
        total_savings / estimate.total_estimated_cost
    } else {
        0.0
    };

    BudgetOptimization {
        candidates,
        selected,
        total_savings,
        reduction,
        max_reduction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::estimate::{CostBreakdown, ResourceCost, ThreePointEstimate};
    use crate::model::Complexity;

    fn estimate(costs: &[(&str, ResourceType, f64)], total: f64) -> BudgetEstimate {
        BudgetEstimate {
            total_estimated_cost: total,
            breakdown: CostBreakdown {
                personnel: total,
                ..CostBreakdown::default()
            },
            resource_costs: costs
                .iter()
                .map(|(id, kind, cost)| ResourceCost {
                    resource_id: id.to_string(),
                    kind: *kind,
                    rate: 1.0,
                    hours: *cost,
                    cost: *cost,
                })
                .collect(),
            unstaffed_hours: 0.0,
            three_point: ThreePointEstimate::from_base(total, Complexity::Medium),
            contingency: 0.0,
            risk_factors: Vec::new(),
        }
    }

    fn resource(id: &str, kind: ResourceType, efficiency: Option<f64>) -> Resource {
        let mut r = Resource::new(id, id, kind);
        r.efficiency = efficiency;
        r
    }

    #[test]
    fn test_only_inefficient_resources_are_candidates() {
        let est = estimate(
            &[
                ("slow", ResourceType::Human, 10_000.0),
                ("fast", ResourceType::Human, 10_000.0),
                ("unknown", ResourceType::Human, 10_000.0),
            ],
            30_000.0,
        );
        let resources = vec![
            resource("slow", ResourceType::Human, Some(0.6)),
            resource("fast", ResourceType::Human, Some(0.95)),
            resource("unknown", ResourceType::Human, None),
        ];
        let opt = optimize_budget(&est, &resources, 0.10, &BudgetConfig::default());
        assert_eq!(opt.candidates.len(), 1);
        assert_eq!(opt.selected[0].resource_id, "slow");
        assert!((opt.total_savings - 1_500.0).abs() < 1e-9);
        assert!((opt.reduction - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_ceiling_limits_selection_and_ratio_orders() {
        let est = estimate(
            &[
                ("dev", ResourceType::Human, 40_000.0),
                ("rig", ResourceType::Equipment, 40_000.0),
            ],
            80_000.0,
        );
        let resources = vec![
            resource("dev", ResourceType::Human, Some(0.5)),
            resource("rig", ResourceType::Equipment, Some(0.5)),
        ];
        // each cut saves 6000; the ceiling only allows one
        let opt = optimize_budget(&est, &resources, 0.10, &BudgetConfig::default());
        assert_eq!(opt.candidates.len(), 2);
        assert_eq!(opt.selected.len(), 1);
        assert_eq!(opt.selected[0].resource_id, "rig");
        assert!(opt.total_savings <= 8_000.0);
    }
}
