//! Double-booking detection shared by the timeline engine and the resource optimizer

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{DateWindow, ResourceAssignment};

use super::graph::TaskNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictSeverity::Low => write!(f, "low"),
            ConflictSeverity::Medium => write!(f, "medium"),
            ConflictSeverity::High => write!(f, "high"),
            ConflictSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Answers criticality questions about a task for severity grading
pub trait Criticality {
    fn is_critical(&self, task_id: &str) -> bool;

    /// Slack in days, when known
    fn slack(&self, task_id: &str) -> Option<i64>;
}

impl Criticality for [TaskNode] {
    fn is_critical(&self, task_id: &str) -> bool {
        self.iter().any(|n| n.task_id == task_id && n.is_critical)
    }

    fn slack(&self, task_id: &str) -> Option<i64> {
        self.iter().find(|n| n.task_id == task_id).map(|n| n.slack)
    }
}

/// Two assignments of one resource whose windows overlap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub resource_id: String,
    pub first_task: String,
    pub second_task: String,
    pub overlap: DateWindow,
    pub combined_allocation: f64,
    pub severity: ConflictSeverity,
}

pub fn grade(
    lookup: &(impl Criticality + ?Sized),
    first: &str,
    second: &str,
    low_slack_days: i64,
) -> ConflictSeverity {
    let critical = [first, second]
        .iter()
        .filter(|id| lookup.is_critical(id))
        .count();

    match critical {
        2 => ConflictSeverity::Critical,
        1 => ConflictSeverity::High,
        _ => {
            let low_slack = [first, second].iter().any(|id| {
                lookup
                    .slack(id)
                    .map(|s| s <= low_slack_days)
                    .unwrap_or(false)
            });
            if low_slack {
                ConflictSeverity::Medium
            } else {
                ConflictSeverity::Low
            }
        }
    }
}

/// Group assignments by resource and check every pair for temporal overlap
pub fn detect_overlaps(
    assignments: &[ResourceAssignment],
    lookup: &(impl Criticality + ?Sized),
    low_slack_days: i64,
) -> Vec<ScheduleConflict> {
    let mut by_resource: BTreeMap<&str, Vec<&ResourceAssignment>> = BTreeMap::new();
    for assignment in assignments {
        by_resource
            .entry(assignment.resource_id.as_str())
            .or_default()
            .push(assignment);
    }

    let mut conflicts = Vec::new();
    for (resource_id, group) in by_resource {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                if a.task_id == b.task_id || !a.window.overlaps(&b.window) {
                    continue;
                }
                conflicts.push(ScheduleConflict {
                    resource_id: resource_id.to_string(),
                    first_task: a.task_id.clone(),
                    second_task: b.task_id.clone(),
                    overlap: DateWindow::new(
                        a.window.start.max(b.window.start),
                        a.window.end.min(b.window.end),
                    ),
                    combined_allocation: a.allocation_percent + b.allocation_percent,
                    severity: grade(lookup, &a.task_id, &b.task_id, low_slack_days),
                });
            }
        }
    }

    conflicts.sort_by(|a, b| b.severity.cmp(&a.severity));
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    struct Fixed(HashMap<&'static str, (bool, i64)>);

    impl Criticality for Fixed {
        fn is_critical(&self, task_id: &str) -> bool {
            self.0.get(task_id).map(|v| v.0).unwrap_or(false)
        }

        fn slack(&self, task_id: &str) -> Option<i64> {
            self.0.get(task_id).map(|v| v.1)
        }
    }

    fn window(from: u32, to: u32) -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 6, from).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, to).unwrap(),
        )
    }

    fn assignments() -> Vec<ResourceAssignment> {
        vec![
            ResourceAssignment::new("r", "task1", 70.0, window(1, 10)),
            ResourceAssignment::new("r", "task2", 60.0, window(5, 15)),
        ]
    }

    #[test]
    fn test_overlap_high_when_one_task_critical() {
        let lookup = Fixed(HashMap::from([("task1", (true, 0)), ("task2", (false, 6))]));
        let conflicts = detect_overlaps(&assignments(), &lookup, 2);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].severity, ConflictSeverity::High);
        assert_eq!(conflicts[0].combined_allocation, 130.0);
        assert_eq!(conflicts[0].overlap, window(5, 10));
    }

    #[test]
    fn test_overlap_severity_by_slack() {
        let both = Fixed(HashMap::from([("task1", (true, 0)), ("task2", (true, 0))]));
        assert_eq!(
            detect_overlaps(&assignments(), &both, 2)[0].severity,
            ConflictSeverity::Critical
        );

        let tight = Fixed(HashMap::from([("task1", (false, 1)), ("task2", (false, 9))]));
        assert_eq!(
            detect_overlaps(&assignments(), &tight, 2)[0].severity,
            ConflictSeverity::Medium
        );

        let loose = Fixed(HashMap::from([("task1", (false, 5)), ("task2", (false, 9))]));
        assert_eq!(
            detect_overlaps(&assignments(), &loose, 2)[0].severity,
            ConflictSeverity::Low
        );
    }

    #[test]
    fn test_disjoint_windows_and_other_resources_ignored() {
        let assignments = vec![
            ResourceAssignment::new("r", "task1", 70.0, window(1, 4)),
            ResourceAssignment::new("r", "task2", 60.0, window(5, 9)),
            ResourceAssignment::new("s", "task3", 60.0, window(1, 9)),
        ];
        let lookup = Fixed(HashMap::new());
        assert!(detect_overlaps(&assignments, &lookup, 2).is_empty());
    }
}
