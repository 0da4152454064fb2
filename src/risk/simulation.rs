//! Monte-Carlo simulation over the task graph
//!
//! Each iteration samples every open task's remaining duration from a
//! triangular distribution spanned by its complexity's three-point
//! multipliers, propagates the sample through the DAG, and derives cost from
//! the sampled work. Seeded, so runs are reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScheduleError;
use crate::model::Task;
use crate::timeline::TaskGraph;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    pub std_dev: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
    pub min: f64,
    pub max: f64,
}

impl Distribution {
    pub fn from_samples(samples: &mut [f64]) -> Self {
        if samples.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
                p10: 0.0,
                p50: 0.0,
                p90: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        samples.sort_by(f64::total_cmp);
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
            p10: percentile(samples, 0.10),
            p50: percentile(samples, 0.50),
            p90: percentile(samples, 0.90),
            min: samples[0],
            max: samples[samples.len() - 1],
        }
    }
}

/// Nearest-rank percentile of sorted samples
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Inverse CDF of the triangular distribution on `[low, high]` with `mode`
pub fn triangular(u: f64, low: f64, mode: f64, high: f64) -> f64 {
    if high <= low {
        return low;
    }
    let span = high - low;
    let split = (mode - low) / span;
    if u < split {
        low + (u * span * (mode - low)).sqrt()
    } else {
        high - ((1.0 - u) * span * (high - mode)).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub iterations: usize,
    pub seed: u64,
    /// Total duration in days
    pub duration: Distribution,
    pub cost: Distribution,
    pub deadline_days: f64,
    pub budget_limit: f64,
    pub on_time_probability: f64,
    pub on_budget_probability: f64,
}

pub struct SimulationInput<'a> {
    pub tasks: &'a [Task],
    pub graph: &'a TaskGraph,
    /// Planned duration per task, indexed like `tasks`
    pub durations: &'a [i64],
    /// Earliest start offset per task, indexed like `tasks`
    pub offsets: &'a [i64],
    /// Cost of the plan at its nominal durations
    pub base_cost: f64,
    pub deadline_days: f64,
    pub budget_limit: f64,
    pub iterations: usize,
    pub seed: u64,
}

pub fn simulate(input: &SimulationInput<'_>) -> Result<SimulationResult, ScheduleError> {
    let order = input.graph.topological_order()?;
    let n = input.tasks.len();
    let iterations = input.iterations.max(1);
    let mut rng = StdRng::seed_from_u64(input.seed);

    let base_work: f64 = input.durations.iter().map(|&d| d as f64).sum();

    let mut durations = Vec::with_capacity(iterations);
    let mut costs = Vec::with_capacity(iterations);
    let mut finish = vec![0.0f64; n];
    let mut sampled = vec![0.0f64; n];

    for _ in 0..iterations {
        for (i, task) in input.tasks.iter().enumerate() {
            let planned = input.durations[i] as f64;
            let done = task.effective_progress();
            let remaining = planned * (1.0 - done);
            let (o, m, p) = task.complexity.three_point();
            let multiplier = triangular(rng.gen::<f64>(), o, m, p);
            sampled[i] = planned * done + remaining * multiplier;
        }

        for &idx in &order {
            let start = input
                .graph
                .predecessors(idx)
                .iter()
                .map(|&p| finish[p])
                .fold(input.offsets[idx] as f64, f64::max);
            finish[idx] = start + sampled[idx];
        }

        let total = finish.iter().copied().fold(0.0, f64::max);
        let work: f64 = sampled.iter().sum();
        let cost = if base_work > 0.0 {
            input.base_cost * work / base_work
        } else {
            input.base_cost
        };

        durations.push(total);
        costs.push(cost);
    }

    let on_time = durations
        .iter()
        .filter(|&&d| d <= input.deadline_days + 1e-9)
        .count() as f64
        / iterations as f64;
    let on_budget = costs
        .iter()
        .filter(|&&c| c <= input.budget_limit + 1e-9)
        .count() as f64
        / iterations as f64;

    let result = SimulationResult {
        iterations,
        seed: input.seed,
        duration: Distribution::from_samples(&mut durations),
        cost: Distribution::from_samples(&mut costs),
        deadline_days: input.deadline_days,
        budget_limit: input.budget_limit,
        on_time_probability: on_time,
        on_budget_probability: on_budget,
    };

    debug!(
        "Simulated {} iterations: duration p50 {:.1}d p90 {:.1}d, on-time {:.0}%",
        iterations,
        result.duration.p50,
        result.duration.p90,
        on_time * 100.0
    );

    Ok(result)
}
