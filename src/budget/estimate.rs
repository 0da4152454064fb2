//! Bottom-up cost estimate with a three-point spread and risk-sized contingency

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BudgetConfig, ResourceConfig};
use crate::model::{Complexity, Project, Resource, ResourceType, Task};
use crate::resource::ResourceAllocation;

/// 90 % two-sided interval of a normal distribution
const Z_90: f64 = 1.645;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub resource_id: String,
    pub kind: ResourceType,
    pub rate: f64,
    pub hours: f64,
    pub cost: f64,
}

/// Category partition of the base estimate. The four parts always sum to the
/// total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub personnel: f64,
    pub technology: f64,
    pub infrastructure: f64,
    pub operations: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.personnel + self.technology + self.infrastructure + self.operations
    }

    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("Personnel", self.personnel),
            ("Technology", self.technology),
            ("Infrastructure", self.infrastructure),
            ("Operations", self.operations),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreePointEstimate {
    pub optimistic: f64,
    pub most_likely: f64,
    pub pessimistic: f64,
    /// PERT mean `(o + 4m + p) / 6`
    pub expected: f64,
    pub std_dev: f64,
    pub confidence_low: f64,
    pub confidence_high: f64,
}

impl ThreePointEstimate {
    pub fn from_base(base: f64, complexity: Complexity) -> Self {
        let (o, m, p) = complexity.three_point();
        let optimistic = base * o;
        let most_likely = base * m;
        let pessimistic = base * p;
        let expected = (optimistic + 4.0 * most_likely + pessimistic) / 6.0;
        let std_dev = (pessimistic - optimistic) / 6.0;
        Self {
            optimistic,
            most_likely,
            pessimistic,
            expected,
            std_dev,
            confidence_low: (expected - Z_90 * std_dev).max(0.0),
            confidence_high: expected + Z_90 * std_dev,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetRisk {
    pub name: String,
    pub probability: f64,
    /// Impact as a share of the base estimate
    pub impact_ratio: f64,
    /// Impact in currency
    pub impact: f64,
}

impl BudgetRisk {
    fn new(name: &str, probability: f64, impact_ratio: f64, base: f64) -> Self {
        Self {
            name: name.to_string(),
            probability,
            impact_ratio,
            impact: base * impact_ratio,
        }
    }

    pub fn exposure(&self) -> f64 {
        self.probability * self.impact
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetEstimate {
    pub total_estimated_cost: f64,
    pub breakdown: CostBreakdown,
    pub resource_costs: Vec<ResourceCost>,
    /// Hours of open work no resource is assigned to, costed at market rate
    pub unstaffed_hours: f64,
    pub three_point: ThreePointEstimate,
    pub contingency: f64,
    pub risk_factors: Vec<BudgetRisk>,
}

impl BudgetEstimate {
    /// Base estimate plus contingency
    pub fn with_contingency(&self) -> f64 {
        self.total_estimated_cost + self.contingency
    }
}

fn operations_factor(complexity: Complexity) -> f64 {
    match complexity {
        Complexity::Trivial => 0.05,
        Complexity::Simple => 0.06,
        Complexity::Medium => 0.08,
        Complexity::Complex => 0.10,
        Complexity::Expert => 0.12,
    }
}

pub fn estimate_budget(
    project: &Project,
    tasks: &[Task],
    resources: &[Resource],
    allocations: &[ResourceAllocation],
    budget: &BudgetConfig,
    resource_config: &ResourceConfig,
) -> BudgetEstimate {
    let rates = &budget.market_rates;
    let floor = budget.market_rate_floor;

    let resource_costs: Vec<ResourceCost> = resources
        .iter()
        .zip(allocations)
        .filter(|(_, a)| a.allocated_hours > 0.0)
        .map(|(r, a)| {
            let rate = r.effective_rate(rates, floor);
            ResourceCost {
                resource_id: r.id.clone(),
                kind: r.kind,
                rate,
                hours: a.allocated_hours,
                cost: rate * a.allocated_hours,
            }
        })
        .collect();

    let staffed: std::collections::HashSet<&str> = allocations
        .iter()
        .flat_map(|a| a.task_ids.iter().map(String::as_str))
        .collect();
    let unstaffed_hours: f64 = tasks
        .iter()
        .filter(|t| t.status.is_open() && !staffed.contains(t.id.as_str()))
        .map(|t| {
            let planned = t.duration_days(resource_config.hours_per_day) as f64
                * resource_config.hours_per_day;
            planned * (1.0 - t.effective_progress())
        })
        .sum();

    let mut breakdown = CostBreakdown::default();
    for cost in &resource_costs {
        match cost.kind {
            ResourceType::Human => breakdown.personnel += cost.cost,
            ResourceType::Software => breakdown.technology += cost.cost,
            ResourceType::Equipment | ResourceType::Space => breakdown.infrastructure += cost.cost,
        }
    }
    breakdown.personnel += unstaffed_hours * rates.human;

    let labour = breakdown.personnel;
    breakdown.technology += labour * project.project_type.technology_factor();
    breakdown.infrastructure += labour * project.project_type.infrastructure_factor();
    breakdown.operations = (breakdown.personnel + breakdown.technology + breakdown.infrastructure)
        * operations_factor(project.complexity);

    let total = breakdown.total();
    let three_point = ThreePointEstimate::from_base(total, project.complexity);

    let mut risk_factors = Vec::new();
    if project.complexity.is_high() {
        risk_factors.push(BudgetRisk::new("Scope creep", 0.4, 0.20, total));
    }
    if allocations.iter().any(|a| a.utilization > 100.0) {
        risk_factors.push(BudgetRisk::new("Resource saturation", 0.5, 0.10, total));
    }
    if !project.emerging_technologies.is_empty() {
        risk_factors.push(BudgetRisk::new("Unstable technology", 0.3, 0.15, total));
    }

    let exposure: f64 = risk_factors.iter().map(BudgetRisk::exposure).sum();
    let contingency = (total * budget.contingency_floor).max(exposure);

    debug!(
        "Budget estimate {:.2} (contingency {:.2}, {} risk factors)",
        total,
        contingency,
        risk_factors.len()
    );

    BudgetEstimate {
        total_estimated_cost: total,
        breakdown,
        resource_costs,
        unstaffed_hours,
        three_point,
        contingency,
        risk_factors,
    }
}
