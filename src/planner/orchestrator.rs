//! Orchestrator for running the four analyzers in parallel
//!
//! Every analyzer is a pure function of the snapshot, so each runs on the
//! blocking pool and the results are joined as they complete. A cycle in the
//! task graph aborts the join; anything else is merged into one plan.

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::budget::{analyze_budget, forecast_for, BudgetAnalysis};
use crate::config::Config;
use crate::error::{PlannerError, ScheduleError};
use crate::model::{ProjectSnapshot, ResourceType};
use crate::repository::ProjectRepository;
use crate::resource::{optimize_allocation, AllocationPlan};
use crate::retry::retry_with_backoff;
use crate::risk::{assess_risks, RiskAssessment};
use crate::timeline::{compute_schedule, Schedule};

use super::alternatives::{generate_alternatives, Baseline};
use super::feasibility::{assess_feasibility, confidence_level, health_score, success_probability};
use super::monitoring::build_framework;
use super::refine::apply_allocation;
use super::types::{ComprehensivePlan, InputFingerprints, PlanOptions, PlanUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analyzer {
    Timeline,
    Resources,
    Budget,
    Risk,
}

impl Analyzer {
    pub const ALL: [Analyzer; 4] = [
        Analyzer::Timeline,
        Analyzer::Resources,
        Analyzer::Budget,
        Analyzer::Risk,
    ];
}

impl std::fmt::Display for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Analyzer::Timeline => write!(f, "timeline"),
            Analyzer::Resources => write!(f, "resources"),
            Analyzer::Budget => write!(f, "budget"),
            Analyzer::Risk => write!(f, "risk"),
        }
    }
}

enum AnalyzerOutput {
    Timeline(Result<Schedule, ScheduleError>),
    Resources(AllocationPlan),
    Budget(BudgetAnalysis),
    Risk(RiskAssessment),
}

fn run_analyzer(
    analyzer: Analyzer,
    snapshot: &ProjectSnapshot,
    config: &Config,
) -> AnalyzerOutput {
    match analyzer {
        Analyzer::Timeline => AnalyzerOutput::Timeline(compute_schedule(snapshot, config)),
        Analyzer::Resources => AnalyzerOutput::Resources(optimize_allocation(snapshot, config)),
        Analyzer::Budget => AnalyzerOutput::Budget(analyze_budget(snapshot, config)),
        Analyzer::Risk => AnalyzerOutput::Risk(assess_risks(snapshot, config)),
    }
}

/// Results of one fan-out; analyzers that were not run stay `None`
#[derive(Default)]
struct Joined {
    schedule: Option<Schedule>,
    allocation: Option<AllocationPlan>,
    budget: Option<BudgetAnalysis>,
    risk: Option<RiskAssessment>,
}

fn missing(analyzer: Analyzer) -> PlannerError {
    PlannerError::Join(format!("{} analyzer returned no result", analyzer))
}

async fn fan_out(
    config: &Arc<Config>,
    snapshot: &Arc<ProjectSnapshot>,
    analyzers: &[Analyzer],
) -> Result<Joined, PlannerError> {
    let start = std::time::Instant::now();
    let mut futures = FuturesUnordered::new();

    for &analyzer in analyzers {
        let config = Arc::clone(config);
        let snapshot = Arc::clone(snapshot);
        futures.push(tokio::task::spawn_blocking(move || {
            (analyzer, run_analyzer(analyzer, &snapshot, &config))
        }));
    }

    let mut joined = Joined::default();
    while let Some(result) = futures.next().await {
        match result {
            Ok((_, AnalyzerOutput::Timeline(Err(e)))) => {
                warn!("Timeline analysis failed: {}", e);
                return Err(e.into());
            }
            Ok((analyzer, output)) => {
                debug!("Completed {} analysis", analyzer);
                match output {
                    AnalyzerOutput::Timeline(Ok(schedule)) => joined.schedule = Some(schedule),
                    AnalyzerOutput::Timeline(Err(_)) => {}
                    AnalyzerOutput::Resources(plan) => joined.allocation = Some(plan),
                    AnalyzerOutput::Budget(analysis) => joined.budget = Some(analysis),
                    AnalyzerOutput::Risk(assessment) => joined.risk = Some(assessment),
                }
            }
            Err(e) => {
                warn!("Analyzer task panicked: {}", e);
                return Err(PlannerError::Join(e.to_string()));
            }
        }
    }

    info!("Ran {} analyzers in {:?}", analyzers.len(), start.elapsed());
    Ok(joined)
}

/// Orchestrates planning passes against an injected repository
pub struct ProjectPlanner {
    config: Arc<Config>,
    repository: Arc<dyn ProjectRepository>,
}

impl ProjectPlanner {
    pub fn new(config: Config, repository: Arc<dyn ProjectRepository>) -> Self {
        Self {
            config: Arc::new(config),
            repository,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn deadline(&self) -> Duration {
        Duration::from_secs(self.config.deadline_sec)
    }

    /// Fetch, analyze and store a new plan version for `project_id`
    pub async fn plan(
        &self,
        project_id: &str,
        options: PlanOptions,
    ) -> Result<ComprehensivePlan, PlannerError> {
        let deadline = self.deadline();
        timeout(deadline, async {
            let snapshot = self.fetch_snapshot(project_id).await?;
            let version = self.next_version(project_id, 0).await?;
            let plan = self.analyze(snapshot, options, version).await?;
            self.store(&plan).await?;
            Ok::<_, PlannerError>(plan)
        })
        .await
        .map_err(|_| PlannerError::DeadlineExceeded(deadline))?
    }

    /// Run every analyzer over a supplied snapshot and derive the plan.
    /// Nothing is fetched or stored.
    pub async fn analyze(
        &self,
        snapshot: ProjectSnapshot,
        options: PlanOptions,
        version: u32,
    ) -> Result<ComprehensivePlan, PlannerError> {
        info!(
            "Planning {} v{} ({} tasks, {} resources)",
            snapshot.project.id,
            version,
            snapshot.tasks.len(),
            snapshot.resources.len()
        );
        snapshot.check_resource_ids()?;
        let snapshot = Arc::new(snapshot);
        let joined = fan_out(&self.config, &snapshot, &Analyzer::ALL).await?;

        let schedule = joined.schedule.ok_or_else(|| missing(Analyzer::Timeline))?;
        let allocation = joined.allocation.ok_or_else(|| missing(Analyzer::Resources))?;
        let budget = joined.budget.ok_or_else(|| missing(Analyzer::Budget))?;
        let risk = joined.risk.ok_or_else(|| missing(Analyzer::Risk))?;

        self.assemble(snapshot, schedule, allocation, budget, risk, options, version)
            .await
    }

    /// Overlay `changes` on the plan's inputs and recompute. Analyzers whose
    /// inputs are unchanged keep their previous result; risk always reruns.
    /// The result is stored as a new version.
    pub async fn update(
        &self,
        plan: &ComprehensivePlan,
        changes: &PlanUpdate,
        options: PlanOptions,
    ) -> Result<ComprehensivePlan, PlannerError> {
        let deadline = self.deadline();
        timeout(deadline, async {
            let mut snapshot = changes.apply(&plan.snapshot);
            snapshot.previous_risk_score = Some(plan.risk.overall_score);
            snapshot.check_resource_ids()?;
            let fingerprints = InputFingerprints::of(&snapshot);

            let mut analyzers = Vec::new();
            if fingerprints.timeline != plan.fingerprints.timeline {
                analyzers.push(Analyzer::Timeline);
            }
            if fingerprints.resources != plan.fingerprints.resources {
                analyzers.push(Analyzer::Resources);
            }
            if fingerprints.budget != plan.fingerprints.budget {
                analyzers.push(Analyzer::Budget);
            }
            analyzers.push(Analyzer::Risk);
            info!(
                "Updating {} v{}: recomputing {:?}",
                plan.project_id, plan.version, analyzers
            );

            let snapshot = Arc::new(snapshot);
            let joined = fan_out(&self.config, &snapshot, &analyzers).await?;

            let version = self.next_version(&plan.project_id, plan.version).await?;
            let next = self
                .assemble(
                    snapshot,
                    joined.schedule.unwrap_or_else(|| plan.schedule.clone()),
                    joined.allocation.unwrap_or_else(|| plan.allocation.clone()),
                    joined.budget.unwrap_or_else(|| plan.budget.clone()),
                    joined.risk.ok_or_else(|| missing(Analyzer::Risk))?,
                    options,
                    version,
                )
                .await?;
            self.store(&next).await?;
            Ok::<_, PlannerError>(next)
        })
        .await
        .map_err(|_| PlannerError::DeadlineExceeded(deadline))?
    }

    async fn fetch_snapshot(&self, project_id: &str) -> Result<ProjectSnapshot, PlannerError> {
        retry_with_backoff(&self.config.retry, PlannerError::is_retryable, || async {
            self.repository
                .fetch_snapshot(project_id)
                .await
                .map_err(PlannerError::from)
        })
        .await
    }

    async fn next_version(&self, project_id: &str, floor: u32) -> Result<u32, PlannerError> {
        let latest = retry_with_backoff(&self.config.retry, PlannerError::is_retryable, || async {
            self.repository
                .latest_version(project_id)
                .await
                .map_err(PlannerError::from)
        })
        .await?;
        Ok(latest.max(floor) + 1)
    }

    async fn store(&self, plan: &ComprehensivePlan) -> Result<(), PlannerError> {
        retry_with_backoff(&self.config.retry, PlannerError::is_retryable, || async {
            self.repository
                .store_plan(plan)
                .await
                .map_err(PlannerError::from)
        })
        .await?;
        info!("Stored plan {} v{}", plan.project_id, plan.version);
        Ok(())
    }

    /// Refine and derive the composite scores
    #[allow(clippy::too_many_arguments)]
    async fn assemble(
        &self,
        snapshot: Arc<ProjectSnapshot>,
        schedule: Schedule,
        allocation: AllocationPlan,
        mut budget: BudgetAnalysis,
        mut risk: RiskAssessment,
        options: PlanOptions,
        version: u32,
    ) -> Result<ComprehensivePlan, PlannerError> {
        let config = &self.config;

        if options.refine {
            // measure earned value against the critical-path duration
            if schedule.total_duration > 0 {
                budget.forecast = forecast_for(
                    &snapshot,
                    budget.baseline,
                    budget.performance.total_spent,
                    schedule.total_duration,
                    config,
                );
            }

            if !allocation.reallocations.is_empty() || !allocation.assignments.is_empty() {
                let refined = apply_allocation(&snapshot, &allocation);
                let config = Arc::clone(config);
                let before = risk.overall_score;
                risk = tokio::task::spawn_blocking(move || assess_risks(&refined, &config))
                    .await
                    .map_err(|e| PlannerError::Join(e.to_string()))?;
                info!(
                    "Refinement applied {} reallocations and {} assignments: risk {:.2} -> {:.2}",
                    allocation.reallocations.len(),
                    allocation.assignments.len(),
                    before,
                    risk.overall_score
                );
            }
        }

        let feasibility = assess_feasibility(&snapshot, &schedule, &allocation, &budget, &risk);
        let success = success_probability(
            &feasibility,
            schedule.completion_probability,
            allocation.optimized_utilization,
            risk.overall_score,
        );
        let confidence = confidence_level(&feasibility, risk.overall_score, options.aggressiveness);
        let health = health_score(&feasibility, risk.overall_score, options.aggressiveness);

        let team_size = snapshot
            .resources
            .iter()
            .filter(|r| r.kind == ResourceType::Human)
            .count();
        let alternatives = generate_alternatives(
            Baseline {
                duration_days: schedule.total_duration,
                budget: budget.baseline,
                team_size,
            },
            &feasibility,
            risk.overall_score,
            options.priority,
        );
        let monitoring = build_framework(
            &snapshot,
            &schedule,
            &allocation,
            &budget,
            &risk,
            config.resources.target_utilization,
        );

        info!(
            "Plan {} v{}: feasibility {:.1} ({}), success {:.0}%, health {:.0}",
            snapshot.project.id,
            version,
            feasibility.overall,
            feasibility.verdict,
            success * 100.0,
            health
        );

        let snapshot = Arc::unwrap_or_clone(snapshot);
        Ok(ComprehensivePlan {
            id: Uuid::new_v4(),
            version,
            created_at: Utc::now(),
            project_id: snapshot.project.id.clone(),
            options,
            fingerprints: InputFingerprints::of(&snapshot),
            snapshot,
            schedule,
            allocation,
            budget,
            risk,
            feasibility,
            success_probability: success,
            confidence,
            health_score: health,
            alternatives,
            monitoring,
        })
    }
}
