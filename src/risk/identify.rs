use chrono::NaiveDate;
use tracing::debug;

use crate::model::{Complexity, ProjectSnapshot};

use super::signals::RiskSignals;
use super::types::{
    MitigationApproach, MitigationStrategy, Risk, RiskCategory, RiskHistoryRecord, RiskStatus,
};

/// Default mitigation for a category, due `days_to_implement` after `as_of`
pub fn default_mitigation(category: RiskCategory, as_of: NaiveDate) -> MitigationStrategy {
    let (approach, description, cost, days, effectiveness, owner) = match category {
        RiskCategory::Technical => (
            MitigationApproach::Mitigate,
            "Prototype the riskiest components early and hold architecture reviews",
            5_000.0,
            14,
            0.7,
            "Tech Lead",
        ),
        RiskCategory::Schedule => (
            MitigationApproach::Mitigate,
            "Re-sequence critical work, fast-track parallel tasks and protect the buffer",
            2_000.0,
            7,
            0.6,
            "Project Manager",
        ),
        RiskCategory::Budget => (
            MitigationApproach::Mitigate,
            "Freeze discretionary spend and review burn rate weekly",
            500.0,
            3,
            0.6,
            "Finance Lead",
        ),
        RiskCategory::Resource => (
            MitigationApproach::Transfer,
            "Rebalance assignments and line up contractors for overflow work",
            8_000.0,
            10,
            0.7,
            "Resource Manager",
        ),
        RiskCategory::Scope => (
            MitigationApproach::Avoid,
            "Agree written acceptance criteria with stakeholders before build",
            1_000.0,
            5,
            0.8,
            "Product Owner",
        ),
        RiskCategory::Quality => (
            MitigationApproach::Mitigate,
            "Raise test coverage and add review gates on critical paths",
            3_000.0,
            10,
            0.7,
            "QA Lead",
        ),
        RiskCategory::External => (
            MitigationApproach::Accept,
            "Track vendor commitments and keep a fallback supplier",
            1_500.0,
            10,
            0.5,
            "Project Sponsor",
        ),
    };

    MitigationStrategy {
        approach,
        description: description.to_string(),
        cost,
        days_to_implement: days,
        effectiveness,
        owner: owner.to_string(),
        deadline: as_of + chrono::Duration::days(days),
    }
}

fn risk(
    category: RiskCategory,
    slug: &str,
    title: &str,
    description: String,
    probability: f64,
    impact: f64,
    as_of: NaiveDate,
) -> Risk {
    Risk {
        id: format!("{}-{}", category, slug),
        category,
        title: title.to_string(),
        description,
        probability: probability.clamp(0.0, 1.0),
        impact: impact.clamp(1.0, 10.0),
        status: RiskStatus::Identified,
        mitigation: default_mitigation(category, as_of),
    }
}

/// Apply every identification rule independently
pub fn identify_risks(snapshot: &ProjectSnapshot, signals: &RiskSignals) -> Vec<Risk> {
    let as_of = snapshot.as_of();
    let project = &snapshot.project;
    let mut risks = Vec::new();

    if project.complexity.is_high() {
        let (p, i) = if project.complexity == Complexity::Expert {
            (0.65, 8.0)
        } else {
            (0.5, 7.0)
        };
        risks.push(risk(
            RiskCategory::Technical,
            "complexity",
            "High technical complexity",
            format!("Project complexity is rated {}", project.complexity),
            p,
            i,
            as_of,
        ));
    }

    if !project.emerging_technologies.is_empty() {
        risks.push(risk(
            RiskCategory::Technical,
            "emerging-tech",
            "Unproven technology",
            format!(
                "The team has not shipped with: {}",
                project.emerging_technologies.join(", ")
            ),
            0.4,
            6.0,
            as_of,
        ));
    }

    let over: Vec<&str> = signals.over_allocated().map(|a| a.name.as_str()).collect();
    if !over.is_empty() {
        risks.push(risk(
            RiskCategory::Resource,
            "over-allocation",
            "Over-allocated resources",
            format!("Allocated beyond capacity: {}", over.join(", ")),
            (0.5 + 0.1 * over.len() as f64).min(0.9),
            6.0,
            as_of,
        ));
    }

    if signals.spend_ratio > 0.7 {
        risks.push(risk(
            RiskCategory::Budget,
            "burn",
            "Budget consumption",
            format!(
                "{:.0}% of the allocated budget is already spent",
                signals.spend_ratio * 100.0
            ),
            signals.spend_ratio.min(0.95),
            if signals.spend_ratio > 1.0 { 8.0 } else { 7.0 },
            as_of,
        ));
    }

    if signals.high_priority_share > 0.3 {
        risks.push(risk(
            RiskCategory::Schedule,
            "pressure",
            "Schedule pressure",
            format!(
                "{:.0}% of tasks are high priority or expert level",
                signals.high_priority_share * 100.0
            ),
            0.6,
            6.0,
            as_of,
        ));
    }

    if project.acceptance_criteria.is_empty() {
        risks.push(risk(
            RiskCategory::Scope,
            "criteria",
            "Undefined acceptance criteria",
            "The project has no acceptance criteria to verify completion against".to_string(),
            0.5,
            5.0,
            as_of,
        ));
    }

    if let Some((name, share)) = &signals.busiest {
        if *share > 0.4 && signals.open_tasks >= 3 {
            risks.push(risk(
                RiskCategory::Resource,
                "key-person",
                "Key-person dependency",
                format!("{} holds {:.0}% of the open tasks", name, share * 100.0),
                0.4,
                7.0,
                as_of,
            ));
        }
    }

    debug!("Identified {} risks", risks.len());
    risks
}

/// Blend each probability with the observed realization rate of its
/// category: `p' = (1 - w) p + w * realized / identified`.
pub fn apply_history(risks: &mut [Risk], history: &[RiskHistoryRecord], weight: f64) {
    for risk in risks.iter_mut() {
        let (identified, realized) = history
            .iter()
            .filter(|h| h.category == risk.category)
            .fold((0u32, 0u32), |(i, r), h| {
                (i + h.identified, r + h.realized.min(h.identified))
            });
        if identified == 0 {
            continue;
        }
        let rate = realized as f64 / identified as f64;
        let adjusted = (1.0 - weight) * risk.probability + weight * rate;
        debug!(
            "Calibrated {} probability {:.2} -> {:.2}",
            risk.id, risk.probability, adjusted
        );
        risk.probability = adjusted.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{BudgetCategory, Project, Resource, ResourceType, Task, TaskPriority};

    fn snapshot() -> ProjectSnapshot {
        let start = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let mut project = Project::new("p", "Portal", start);
        project.acceptance_criteria = vec!["Checkout works".into()];
        let mut snap = ProjectSnapshot::new(project);
        snap.as_of = Some(start);
        snap
    }

    fn identify(snap: &ProjectSnapshot) -> Vec<Risk> {
        identify_risks(snap, &RiskSignals::collect(snap, &Config::default()))
    }

    #[test]
    fn test_clean_project_has_no_risks() {
        assert!(identify(&snapshot()).is_empty());
    }

    #[test]
    fn test_budget_risk_above_seventy_percent_spend() {
        let mut snap = snapshot();
        snap.budgets = vec![BudgetCategory::new("Personnel", 10_000.0, 8_000.0)];
        let risks = identify(&snap);
        assert_eq!(risks.len(), 1);
        assert_eq!(risks[0].category, RiskCategory::Budget);
        assert_eq!(risks[0].probability, 0.8);
        assert_eq!(risks[0].mitigation.owner, "Finance Lead");
    }

    #[test]
    fn test_each_rule_triggers_independently() {
        let mut snap = snapshot();
        snap.project.complexity = Complexity::Expert;
        snap.project.acceptance_criteria.clear();
        snap.resources = vec![
            Resource::new("a", "Ana", ResourceType::Human),
            Resource::new("b", "Ben", ResourceType::Human),
        ];
        snap.tasks = (0..4)
            .map(|i| {
                Task::new(format!("t{}", i), "work")
                    .with_days(30.0)
                    .with_priority(TaskPriority::High)
                    .assigned_to("a")
            })
            .collect();

        let risks = identify(&snap);
        let ids: Vec<&str> = risks.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&"technical-complexity"));
        assert!(ids.contains(&"resource-over-allocation"));
        assert!(ids.contains(&"schedule-pressure"));
        assert!(ids.contains(&"scope-criteria"));
        assert!(ids.contains(&"resource-key-person"));
        assert!(!ids.contains(&"budget-burn"));
    }

    #[test]
    fn test_history_blends_probability() {
        let mut snap = snapshot();
        snap.budgets = vec![BudgetCategory::new("Personnel", 10_000.0, 8_000.0)];
        let mut risks = identify(&snap);
        let history = vec![
            RiskHistoryRecord {
                category: RiskCategory::Budget,
                identified: 4,
                realized: 1,
            },
            RiskHistoryRecord {
                category: RiskCategory::Scope,
                identified: 10,
                realized: 10,
            },
        ];
        apply_history(&mut risks, &history, 0.3);
        // 0.7 * 0.8 + 0.3 * 0.25
        assert!((risks[0].probability - 0.635).abs() < 1e-9);
    }
}
