use serde::{Deserialize, Serialize};

use crate::config::OptimizationPriority;

use super::feasibility::Feasibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeKind {
    TimeOptimized,
    CostOptimized,
    QualityFocused,
}

impl AlternativeKind {
    /// Multipliers on (duration, budget, team size)
    pub fn multipliers(self) -> (f64, f64, f64) {
        match self {
            AlternativeKind::TimeOptimized => (0.75, 1.25, 1.4),
            AlternativeKind::CostOptimized => (1.3, 0.8, 0.8),
            AlternativeKind::QualityFocused => (1.2, 1.15, 1.1),
        }
    }

    fn serves(self, priority: OptimizationPriority) -> bool {
        matches!(
            (self, priority),
            (AlternativeKind::TimeOptimized, OptimizationPriority::Time)
                | (AlternativeKind::CostOptimized, OptimizationPriority::Cost)
                | (AlternativeKind::QualityFocused, OptimizationPriority::Quality)
        )
    }
}

impl std::fmt::Display for AlternativeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlternativeKind::TimeOptimized => write!(f, "Time-optimized"),
            AlternativeKind::CostOptimized => write!(f, "Cost-optimized"),
            AlternativeKind::QualityFocused => write!(f, "Quality-focused"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub kind: AlternativeKind,
    pub name: String,
    pub duration_days: i64,
    pub budget: f64,
    pub team_size: usize,
    pub tradeoffs: Vec<String>,
    /// 0 ..= 10, higher is a better fit for the caller's priority
    pub recommendation_score: f64,
}

/// The baseline the variants are derived from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub duration_days: i64,
    pub budget: f64,
    pub team_size: usize,
}

fn tradeoffs(kind: AlternativeKind) -> Vec<String> {
    let lines: &[&str] = match kind {
        AlternativeKind::TimeOptimized => &[
            "Delivers 25% sooner",
            "Costs 25% more",
            "Needs 40% more people and tighter coordination",
            "Parallel work raises integration risk",
        ],
        AlternativeKind::CostOptimized => &[
            "Saves 20% of the budget",
            "Takes 30% longer",
            "Runs with a 20% smaller team",
            "Less slack to absorb key-person absence",
        ],
        AlternativeKind::QualityFocused => &[
            "Adds review and test time for 20% longer delivery",
            "Costs 15% more",
            "Grows the team by 10% for dedicated quality roles",
            "Lowers defect and rework risk",
        ],
    };
    lines.iter().map(|l| l.to_string()).collect()
}

pub fn generate_alternatives(
    baseline: Baseline,
    feasibility: &Feasibility,
    risk_score: f64,
    priority: OptimizationPriority,
) -> Vec<Alternative> {
    let scores = &feasibility.scores;
    let team = baseline.team_size.max(1) as f64;

    [
        AlternativeKind::TimeOptimized,
        AlternativeKind::CostOptimized,
        AlternativeKind::QualityFocused,
    ]
    .into_iter()
    .map(|kind| {
        let (duration, budget, size) = kind.multipliers();

        // each variant is worth more where the baseline is weakest
        let mut score = 5.0
            + match kind {
                AlternativeKind::TimeOptimized => (10.0 - scores.timeline) * 0.2,
                AlternativeKind::CostOptimized => (10.0 - scores.budget) * 0.2,
                AlternativeKind::QualityFocused => (10.0 - scores.technical) * 0.2,
            };
        if kind == AlternativeKind::TimeOptimized && risk_score >= 7.0 {
            score -= 1.0;
        }
        if kind.serves(priority) {
            score += 3.0;
        } else if priority == OptimizationPriority::Balanced {
            score += 1.0;
        }

        Alternative {
            kind,
            name: kind.to_string(),
            duration_days: (baseline.duration_days as f64 * duration).round() as i64,
            budget: baseline.budget * budget,
            team_size: ((team * size).round() as usize).max(1),
            tradeoffs: tradeoffs(kind),
            recommendation_score: score.clamp(0.0, 10.0),
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::feasibility::{DimensionScores, FeasibilityVerdict};

    fn feasibility() -> Feasibility {
        let scores = DimensionScores {
            technical: 8.0,
            resource: 8.0,
            budget: 8.0,
            timeline: 8.0,
            risk: 8.0,
        };
        Feasibility {
            scores,
            overall: 8.0,
            verdict: FeasibilityVerdict::High,
            concerns: Vec::new(),
        }
    }

    fn baseline() -> Baseline {
        Baseline {
            duration_days: 100,
            budget: 200_000.0,
            team_size: 5,
        }
    }

    #[test]
    fn test_fixed_multipliers() {
        let alts = generate_alternatives(
            baseline(),
            &feasibility(),
            3.0,
            OptimizationPriority::Balanced,
        );
        assert_eq!(alts.len(), 3);

        let time = &alts[0];
        assert_eq!(time.duration_days, 75);
        assert_eq!(time.budget, 250_000.0);
        assert_eq!(time.team_size, 7);

        let cost = &alts[1];
        assert_eq!(cost.duration_days, 130);
        assert_eq!(cost.budget, 160_000.0);
        assert_eq!(cost.team_size, 4);

        let quality = &alts[2];
        assert_eq!(quality.duration_days, 120);
        assert!((quality.budget - 230_000.0).abs() < 1e-6);
        assert_eq!(quality.team_size, 6);
        assert!(alts.iter().all(|a| !a.tradeoffs.is_empty()));
    }

    #[test]
    fn test_priority_drives_recommendation() {
        for (priority, kind) in [
            (OptimizationPriority::Time, AlternativeKind::TimeOptimized),
            (OptimizationPriority::Cost, AlternativeKind::CostOptimized),
            (OptimizationPriority::Quality, AlternativeKind::QualityFocused),
        ] {
            let alts = generate_alternatives(baseline(), &feasibility(), 3.0, priority);
            let best = alts
                .iter()
                .max_by(|a, b| a.recommendation_score.total_cmp(&b.recommendation_score))
                .unwrap();
            assert_eq!(best.kind, kind);
        }
    }

    #[test]
    fn test_team_never_below_one() {
        let mut b = baseline();
        b.team_size = 1;
        let alts = generate_alternatives(b, &feasibility(), 3.0, OptimizationPriority::Cost);
        assert_eq!(alts[1].team_size, 1);
    }
}
