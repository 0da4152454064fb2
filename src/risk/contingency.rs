use serde::{Deserialize, Serialize};

use super::signals::RiskSignals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    ScheduleSlip,
    BudgetOverrun,
    CriticalResourceLoss,
    TechnicalBlocker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyAction {
    pub step: usize,
    pub action: String,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTrigger {
    pub kind: TriggerKind,
    pub condition: String,
    pub actions: Vec<ContingencyAction>,
    /// Whether the condition holds for the current inputs
    pub active: bool,
    pub evidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyPlan {
    pub triggers: Vec<ContingencyTrigger>,
    pub reserved_budget: f64,
}

impl ContingencyPlan {
    pub fn active(&self) -> impl Iterator<Item = &ContingencyTrigger> {
        self.triggers.iter().filter(|t| t.active)
    }
}

pub const SCHEDULE_SLIP_DAYS: f64 = 14.0;
pub const BUDGET_OVERRUN: f64 = 0.15;

fn actions(steps: &[(&str, &str)]) -> Vec<ContingencyAction> {
    steps
        .iter()
        .enumerate()
        .map(|(i, (action, owner))| ContingencyAction {
            step: i + 1,
            action: action.to_string(),
            owner: owner.to_string(),
        })
        .collect()
}

pub fn contingency_plan(
    signals: &RiskSignals,
    total_budget: f64,
    reserve_ratio: f64,
) -> ContingencyPlan {
    let slip = signals.schedule_slip_days();
    let overrun = signals.budget_overrun();

    let triggers = vec![
        ContingencyTrigger {
            kind: TriggerKind::ScheduleSlip,
            condition: format!("Schedule slips by more than {} days", SCHEDULE_SLIP_DAYS),
            actions: actions(&[
                (
                    "Re-plan the critical path and identify tasks to fast-track",
                    "Project Manager",
                ),
                ("Approve overtime or temporary staff for critical tasks", "Project Sponsor"),
                ("Negotiate scope deferrals for non-critical features", "Product Owner"),
                ("Communicate the revised timeline to stakeholders", "Project Manager"),
            ]),
            active: slip > SCHEDULE_SLIP_DAYS,
            evidence: (slip > 0.0).then(|| format!("{:.1} days behind plan", slip)),
        },
        ContingencyTrigger {
            kind: TriggerKind::BudgetOverrun,
            condition: format!(
                "Spend exceeds the budget by more than {:.0}%",
                BUDGET_OVERRUN * 100.0
            ),
            actions: actions(&[
                ("Freeze non-essential spending", "Finance Lead"),
                ("Release the contingency reserve for committed work", "Project Sponsor"),
                ("Re-estimate remaining work and cut low-value scope", "Project Manager"),
            ]),
            active: overrun > BUDGET_OVERRUN,
            evidence: (overrun > 0.0).then(|| format!("{:.0}% over budget", overrun * 100.0)),
        },
        ContingencyTrigger {
            kind: TriggerKind::CriticalResourceLoss,
            condition: "A resource holding open tasks leaves the project".to_string(),
            actions: actions(&[
                ("Reassign open tasks to the closest skill match", "Resource Manager"),
                ("Engage a contractor to backfill the role", "Resource Manager"),
                ("Schedule knowledge transfer from remaining team members", "Tech Lead"),
            ]),
            active: !signals.lost_resources.is_empty(),
            evidence: (!signals.lost_resources.is_empty())
                .then(|| format!("Departed: {}", signals.lost_resources.join(", "))),
        },
        ContingencyTrigger {
            kind: TriggerKind::TechnicalBlocker,
            condition: "A critical or complex task is blocked".to_string(),
            actions: actions(&[
                ("Convene a technical review of the blocker", "Tech Lead"),
                ("Evaluate alternative designs or vendor support", "Architect"),
                ("Re-sequence dependent work around the blocker", "Project Manager"),
            ]),
            active: !signals.technical_blockers.is_empty(),
            evidence: (!signals.technical_blockers.is_empty())
                .then(|| format!("Blocked: {}", signals.technical_blockers.join(", "))),
        },
    ];

    ContingencyPlan {
        triggers,
        reserved_budget: total_budget * reserve_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> RiskSignals {
        RiskSignals {
            spend_ratio: 0.5,
            total_spent: 5_000.0,
            baseline_budget: 10_000.0,
            estimated_cost: 0.0,
            progress: 0.5,
            planned_progress: 0.5,
            total_days: 100,
            schedule_performance: 1.0,
            cost_performance: 1.0,
            allocations: Vec::new(),
            high_priority_share: 0.0,
            turnover: 0.0,
            busiest: None,
            open_tasks: 2,
            lost_resources: Vec::new(),
            technical_blockers: Vec::new(),
        }
    }

    #[test]
    fn test_four_fixed_triggers_with_reserve() {
        let plan = contingency_plan(&signals(), 50_000.0, 0.10);
        assert_eq!(plan.triggers.len(), 4);
        assert_eq!(plan.reserved_budget, 5_000.0);
        assert_eq!(plan.active().count(), 0);
        assert!(plan
            .triggers
            .iter()
            .all(|t| t.actions.first().map(|a| a.step) == Some(1)));
    }

    #[test]
    fn test_triggers_evaluate_against_signals() {
        let mut s = signals();
        // 20 % behind on a 100-day plan
        s.progress = 0.3;
        s.spend_ratio = 1.2;
        s.technical_blockers = vec!["auth".into()];
        let plan = contingency_plan(&s, 10_000.0, 0.10);
        let active: Vec<TriggerKind> = plan.active().map(|t| t.kind).collect();
        assert_eq!(
            active,
            vec![
                TriggerKind::ScheduleSlip,
                TriggerKind::BudgetOverrun,
                TriggerKind::TechnicalBlocker
            ]
        );
    }
}
