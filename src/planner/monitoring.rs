//! Monitoring framework attached to every plan: KPIs with targets, control
//! points from milestones and phases, and escalation triggers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::budget::BudgetAnalysis;
use crate::model::ProjectSnapshot;
use crate::resource::AllocationPlan;
use crate::risk::{RiskAssessment, RiskLevel};
use crate::timeline::{ConflictSeverity, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiDirection {
    AtLeast,
    AtMost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpi {
    pub name: String,
    pub current: f64,
    pub target: f64,
    pub direction: KpiDirection,
    pub unit: String,
}

impl Kpi {
    fn new(name: &str, current: f64, target: f64, direction: KpiDirection, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            current,
            target,
            direction,
            unit: unit.to_string(),
        }
    }

    pub fn on_target(&self) -> bool {
        match self.direction {
            KpiDirection::AtLeast => self.current >= self.target - 1e-9,
            KpiDirection::AtMost => self.current <= self.target + 1e-9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPointKind {
    Milestone,
    PhaseGate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlPointStatus {
    Met,
    Upcoming,
    /// Scheduled finish of its tasks falls after the due date
    AtRisk,
    Missed,
}

impl std::fmt::Display for ControlPointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlPointStatus::Met => write!(f, "met"),
            ControlPointStatus::Upcoming => write!(f, "upcoming"),
            ControlPointStatus::AtRisk => write!(f, "at risk"),
            ControlPointStatus::Missed => write!(f, "missed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub id: String,
    pub name: String,
    pub kind: ControlPointKind,
    pub due: NaiveDate,
    pub task_ids: Vec<String>,
    /// Latest scheduled finish among its tasks
    pub forecast: Option<NaiveDate>,
    pub status: ControlPointStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationLevel {
    ProjectManager,
    Sponsor,
    SteeringCommittee,
}

impl std::fmt::Display for EscalationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscalationLevel::ProjectManager => write!(f, "project manager"),
            EscalationLevel::Sponsor => write!(f, "sponsor"),
            EscalationLevel::SteeringCommittee => write!(f, "steering committee"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationTrigger {
    pub condition: String,
    pub level: EscalationLevel,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringFramework {
    pub kpis: Vec<Kpi>,
    /// Ordered by due date
    pub control_points: Vec<ControlPoint>,
    pub escalation: Vec<EscalationTrigger>,
    pub review_cadence_days: u32,
}

impl MonitoringFramework {
    pub fn active_escalations(&self) -> impl Iterator<Item = &EscalationTrigger> {
        self.escalation.iter().filter(|e| e.active)
    }
}

fn control_point(
    snapshot: &ProjectSnapshot,
    schedule: &Schedule,
    as_of: NaiveDate,
    (id, name, kind, due, task_ids): (&str, &str, ControlPointKind, NaiveDate, &[String]),
) -> ControlPoint {
    let forecast = task_ids
        .iter()
        .filter_map(|t| schedule.node(t))
        .map(|n| n.scheduled_finish)
        .max();
    let done = !task_ids.is_empty()
        && task_ids
            .iter()
            .all(|t| snapshot.task(t).is_some_and(|t| !t.status.is_open()));

    let status = if done {
        ControlPointStatus::Met
    } else if due < as_of {
        ControlPointStatus::Missed
    } else if forecast.is_some_and(|f| f > due) {
        ControlPointStatus::AtRisk
    } else {
        ControlPointStatus::Upcoming
    };

    ControlPoint {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        due,
        task_ids: task_ids.to_vec(),
        forecast,
        status,
    }
}

pub fn build_framework(
    snapshot: &ProjectSnapshot,
    schedule: &Schedule,
    allocation: &AllocationPlan,
    budget: &BudgetAnalysis,
    risk: &RiskAssessment,
    target_utilization: f64,
) -> MonitoringFramework {
    let forecast = &budget.forecast;
    let spend_ratio = if budget.baseline > 0.0 {
        budget.performance.total_spent / budget.baseline
    } else {
        0.0
    };

    let kpis = vec![
        Kpi::new("Schedule performance index", forecast.spi, 1.0, KpiDirection::AtLeast, "ratio"),
        Kpi::new("Cost performance index", forecast.cpi, 1.0, KpiDirection::AtLeast, "ratio"),
        Kpi::new(
            "Completion probability",
            schedule.completion_probability * 100.0,
            80.0,
            KpiDirection::AtLeast,
            "%",
        ),
        Kpi::new(
            "Resource utilization",
            allocation.optimized_utilization,
            target_utilization,
            KpiDirection::AtLeast,
            "%",
        ),
        Kpi::new(
            "Budget consumed",
            spend_ratio * 100.0,
            forecast.earned_value / forecast.budget_at_completion.max(f64::EPSILON) * 100.0,
            KpiDirection::AtMost,
            "%",
        ),
        Kpi::new("Overall risk score", risk.overall_score, 5.0, KpiDirection::AtMost, "score"),
    ];

    let as_of = snapshot.as_of();
    let mut control_points: Vec<ControlPoint> = snapshot
        .milestones
        .iter()
        .map(|m| {
            control_point(
                snapshot,
                schedule,
                as_of,
                (&m.id, &m.name, ControlPointKind::Milestone, m.due_date, &m.task_ids),
            )
        })
        .chain(snapshot.phases.iter().map(|p| {
            control_point(
                snapshot,
                schedule,
                as_of,
                (&p.id, &p.name, ControlPointKind::PhaseGate, p.end, &p.task_ids),
            )
        }))
        .collect();
    control_points.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.id.cmp(&b.id)));

    let missed = control_points
        .iter()
        .filter(|c| c.status == ControlPointStatus::Missed)
        .count();
    let critical_conflicts = allocation
        .conflicts
        .iter()
        .any(|c| c.severity == ConflictSeverity::Critical);

    let escalation = vec![
        EscalationTrigger {
            condition: "Schedule or cost performance index below 0.9".to_string(),
            level: EscalationLevel::ProjectManager,
            active: forecast.spi < 0.9 || forecast.cpi < 0.9,
        },
        EscalationTrigger {
            condition: "A critical resource conflict is open".to_string(),
            level: EscalationLevel::ProjectManager,
            active: critical_conflicts,
        },
        EscalationTrigger {
            condition: "Schedule or cost performance index below 0.8".to_string(),
            level: EscalationLevel::Sponsor,
            active: forecast.spi < 0.8 || forecast.cpi < 0.8,
        },
        EscalationTrigger {
            condition: "A milestone or phase gate was missed".to_string(),
            level: EscalationLevel::Sponsor,
            active: missed > 0,
        },
        EscalationTrigger {
            condition: "Overall risk level is critical".to_string(),
            level: EscalationLevel::SteeringCommittee,
            active: risk.level == RiskLevel::Critical,
        },
    ];

    let review_cadence_days = match risk.level {
        RiskLevel::Critical | RiskLevel::High => 7,
        RiskLevel::Moderate => 14,
        RiskLevel::Low => 30,
    };

    MonitoringFramework {
        kpis,
        control_points,
        escalation,
        review_cadence_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::analyze_budget;
    use crate::config::Config;
    use crate::model::{Dependency, Milestone, Phase, Project, Task, TaskStatus};
    use crate::resource::optimize_allocation;
    use crate::risk::assess_risks;
    use crate::timeline::compute_schedule;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn milestone(id: &str, due: NaiveDate, task: &str) -> Milestone {
        Milestone {
            id: id.into(),
            name: id.to_uppercase(),
            due_date: due,
            task_ids: vec![task.into()],
        }
    }

    /// a (2d) -> b (3d) -> c (5d) from March 3rd: finishes on the 5th, 8th and 13th
    fn snapshot() -> ProjectSnapshot {
        let mut snap = ProjectSnapshot::new(Project::new("p", "P", d(3)));
        let mut design = Task::new("a", "Design").with_days(2.0);
        design.status = TaskStatus::Completed;
        snap.tasks = vec![
            design,
            Task::new("b", "Build").with_days(3.0),
            Task::new("c", "Launch").with_days(5.0),
        ];
        snap.dependencies = vec![Dependency::new("b", "a"), Dependency::new("c", "b")];
        snap.milestones = vec![
            milestone("late", d(12), "c"),
            milestone("done", d(4), "a"),
            milestone("missed", d(7), "b"),
        ];
        snap.phases = vec![Phase {
            id: "build".into(),
            name: "Build".into(),
            start: d(5),
            end: d(20),
            task_ids: vec!["b".into()],
        }];
        snap.as_of = Some(d(10));
        snap
    }

    fn monitor(
        snap: &ProjectSnapshot,
        adjust: impl FnOnce(&mut BudgetAnalysis, &mut RiskAssessment),
    ) -> MonitoringFramework {
        let mut config = Config::default();
        config.risk.simulation_iterations = 200;
        let schedule = compute_schedule(snap, &config).unwrap();
        let allocation = optimize_allocation(snap, &config);
        let mut budget = analyze_budget(snap, &config);
        let mut risk = assess_risks(snap, &config);
        adjust(&mut budget, &mut risk);
        build_framework(snap, &schedule, &allocation, &budget, &risk, 80.0)
    }

    fn trigger<'a>(framework: &'a MonitoringFramework, condition: &str) -> &'a EscalationTrigger {
        framework
            .escalation
            .iter()
            .find(|e| e.condition == condition)
            .unwrap()
    }

    #[test]
    fn test_control_point_statuses() {
        let framework = monitor(&snapshot(), |_, _| {});
        let points: Vec<_> = framework
            .control_points
            .iter()
            .map(|c| (c.id.as_str(), c.kind, c.status))
            .collect();
        assert_eq!(
            points,
            vec![
                ("done", ControlPointKind::Milestone, ControlPointStatus::Met),
                ("missed", ControlPointKind::Milestone, ControlPointStatus::Missed),
                ("late", ControlPointKind::Milestone, ControlPointStatus::AtRisk),
                ("build", ControlPointKind::PhaseGate, ControlPointStatus::Upcoming),
            ]
        );
        let late = &framework.control_points[2];
        assert_eq!(late.forecast, Some(d(13)));
        assert_eq!(framework.control_points[3].due, d(20));
    }

    #[test]
    fn test_missed_control_point_escalates_to_sponsor() {
        let framework = monitor(&snapshot(), |_, _| {});
        let missed = trigger(&framework, "A milestone or phase gate was missed");
        assert!(missed.active);
        assert_eq!(missed.level, EscalationLevel::Sponsor);

        let mut on_track = snapshot();
        on_track.milestones.retain(|m| m.id != "missed");
        let framework = monitor(&on_track, |_, _| {});
        assert!(!trigger(&framework, "A milestone or phase gate was missed").active);
    }

    #[test]
    fn test_performance_index_triggers() {
        let healthy = monitor(&snapshot(), |budget, _| {
            budget.forecast.spi = 1.0;
            budget.forecast.cpi = 1.0;
        });
        assert!(!trigger(&healthy, "Schedule or cost performance index below 0.9").active);
        assert!(!trigger(&healthy, "Schedule or cost performance index below 0.8").active);

        let slipping = monitor(&snapshot(), |budget, _| {
            budget.forecast.spi = 0.85;
            budget.forecast.cpi = 1.0;
        });
        assert!(trigger(&slipping, "Schedule or cost performance index below 0.9").active);
        assert!(!trigger(&slipping, "Schedule or cost performance index below 0.8").active);

        let overrun = monitor(&snapshot(), |budget, _| {
            budget.forecast.spi = 1.0;
            budget.forecast.cpi = 0.75;
        });
        let sponsor = trigger(&overrun, "Schedule or cost performance index below 0.8");
        assert!(sponsor.active);
        assert_eq!(sponsor.level, EscalationLevel::Sponsor);
        assert!(overrun
            .active_escalations()
            .any(|e| e.level == EscalationLevel::ProjectManager));
    }

    #[test]
    fn test_review_cadence_follows_risk_level() {
        let cadence = |level: RiskLevel| {
            let framework = monitor(&snapshot(), |_, risk| risk.level = level);
            let steering = trigger(&framework, "Overall risk level is critical").active;
            (framework.review_cadence_days, steering)
        };
        assert_eq!(cadence(RiskLevel::Critical), (7, true));
        assert_eq!(cadence(RiskLevel::High), (7, false));
        assert_eq!(cadence(RiskLevel::Moderate), (14, false));
        assert_eq!(cadence(RiskLevel::Low), (30, false));
    }

    #[test]
    fn test_kpi_direction() {
        let spi = Kpi::new("SPI", 0.95, 1.0, KpiDirection::AtLeast, "ratio");
        assert!(!spi.on_target());
        let risk = Kpi::new("Risk", 4.0, 5.0, KpiDirection::AtMost, "score");
        assert!(risk.on_target());
    }
}
