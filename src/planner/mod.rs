//! Project planner: runs the timeline, resource, budget and risk analyzers
//! concurrently over one snapshot and derives a versioned plan
//!
//! 1. Fetch the snapshot through the repository (deadline + retry)
//! 2. Fan out the four analyzers, fail fast on a dependency cycle
//! 3. Refine: apply proposed reallocations, re-assess risk, re-forecast
//!    earned value over the critical-path duration
//! 4. Derive feasibility, success probability, confidence, health,
//!    alternatives and the monitoring framework
//! 5. Store the result as the next version

pub mod alternatives;
pub mod feasibility;
pub mod monitoring;
pub mod orchestrator;
pub mod refine;
pub mod types;

pub use alternatives::{generate_alternatives, Alternative, AlternativeKind, Baseline};
pub use feasibility::{
    assess_feasibility, confidence_level, health_score, success_probability, DimensionScores,
    Feasibility, FeasibilityVerdict,
};
pub use monitoring::{
    build_framework, ControlPoint, ControlPointKind, ControlPointStatus, EscalationLevel,
    EscalationTrigger, Kpi, KpiDirection, MonitoringFramework,
};
pub use orchestrator::{Analyzer, ProjectPlanner};
pub use refine::apply_allocation;
pub use types::{ComprehensivePlan, InputFingerprints, PlanOptions, PlanUpdate};
