pub mod import;
pub mod plan;
pub mod schema;
pub mod simulate;
pub mod track;
pub mod update;

use crate::config::{Aggressiveness, Config, OptimizationPriority};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "planforge")]
#[command(
    author,
    version,
    about = "Project planning engine: schedule, staffing, budget and risk in one pass"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Store a project snapshot in the data directory
    Import(ImportArgs),

    /// Analyze a project and store a new plan version
    Plan(PlanArgs),

    /// Apply changes to a stored plan and recompute what they affect
    Update(UpdateArgs),

    /// Budget tracking and earned value for a project
    Track(TrackArgs),

    /// Run the Monte-Carlo schedule and cost simulation
    Simulate(SimulateArgs),

    /// Print JSON Schema for config validation
    Schema,
}

/// Config location and directory overrides shared by every subcommand
#[derive(Args, Clone)]
pub struct ConfigArgs {
    /// Path to config file (defaults apply when it does not exist)
    #[arg(short, long, default_value = "planforge.yaml")]
    pub config: PathBuf,

    /// Override the data directory holding snapshots and plans
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override output directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}

impl ConfigArgs {
    /// Load the config file, apply CLI overrides and validate
    pub fn load(&self) -> anyhow::Result<Config> {
        info!("Loading config from {:?}", self.config);
        let mut config = Config::load_or_default(&self.config)?;

        if let Some(ref data_dir) = self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(ref report_dir) = self.report_dir {
            config.report_dir = report_dir.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Parser, Clone)]
pub struct ImportArgs {
    /// Snapshot JSON file to import
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Parser, Clone)]
pub struct PlanArgs {
    /// Project to plan
    pub project: String,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Optimization priority (time, cost, quality, balanced)
    #[arg(long)]
    pub priority: Option<OptimizationPriority>,

    /// How hard alternatives push (conservative, balanced, aggressive)
    #[arg(long)]
    pub aggressiveness: Option<Aggressiveness>,

    /// Skip applying proposed reallocations before scoring
    #[arg(long)]
    pub no_refine: bool,

    /// Analyze without storing a plan or writing reports
    #[arg(long)]
    pub dry_run: bool,

    /// Print the plan as JSON instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Exit 1 if the plan is infeasible or its risk is critical (CI mode)
    #[arg(long)]
    pub fail_on_critical: bool,
}

#[derive(Parser, Clone)]
pub struct UpdateArgs {
    /// Project whose plan to update
    pub project: String,

    /// JSON file with the replaced collections (tasks, dependencies, resources,
    /// assignments, budgets, expenses)
    #[arg(long, value_name = "FILE")]
    pub changes: PathBuf,

    /// Plan version to start from (default: latest)
    #[arg(long)]
    pub from_version: Option<u32>,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the updated plan as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct TrackArgs {
    /// Project to track
    pub project: String,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the budget analysis as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct SimulateArgs {
    /// Project to simulate
    pub project: String,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the number of iterations
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the simulation result as JSON
    #[arg(long)]
    pub json: bool,
}
