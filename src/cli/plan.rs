//! CLI handler for the `plan` subcommand
//!
//! Runs the four analyzers over a stored snapshot, stores the resulting plan
//! version and writes its reports.

use crate::cli::PlanArgs;
use crate::output::{write_plan_report, write_summary};
use crate::planner::{ComprehensivePlan, PlanOptions, ProjectPlanner};
use crate::repository::{JsonFileRepository, ProjectRepository};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

pub async fn execute(args: PlanArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;

    let mut options = PlanOptions::from_config(&config);
    if let Some(priority) = args.priority {
        options.priority = priority;
    }
    if let Some(aggressiveness) = args.aggressiveness {
        options.aggressiveness = aggressiveness;
    }
    if args.no_refine {
        options.refine = false;
    }

    let report_dir = config.report_dir.clone();
    let repository = Arc::new(JsonFileRepository::new(&config.data_dir));
    let planner = ProjectPlanner::new(config, repository.clone());

    if args.dry_run {
        info!("DRY RUN - nothing will be stored");
        let snapshot = repository.fetch_snapshot(&args.project).await?;
        let version = repository.latest_version(&args.project).await? + 1;
        let plan = planner.analyze(snapshot, options, version).await?;
        print_plan(&plan, None);
        return Ok(());
    }

    let plan = planner.plan(&args.project, options).await?;
    info!("Reports will be written to {:?}", report_dir);
    let report = write_plan_report(&report_dir, &plan)?;
    let summary = write_summary(&report_dir, &plan)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan, Some(&report));
    }

    if args.fail_on_critical && summary.exit_code != 0 {
        error!(
            "Exiting with error: feasibility {} and risk {}",
            plan.feasibility.verdict, plan.risk.level
        );
        std::process::exit(1);
    }

    Ok(())
}

pub(crate) fn print_plan(plan: &ComprehensivePlan, report: Option<&Path>) {
    let schedule = &plan.schedule;
    let budget = &plan.budget;

    println!(
        "\n┌─ {} v{} ─────────────────────────────────────────────",
        plan.snapshot.project.name, plan.version
    );
    println!(
        "│ Feasibility  {:.1}/10 ({})",
        plan.feasibility.overall, plan.feasibility.verdict
    );
    println!(
        "│ Success      {:.0}%  confidence {:.0}%  health {:.0}",
        plan.success_probability * 100.0,
        plan.confidence * 100.0,
        plan.health_score
    );
    println!(
        "│ Timeline     {} days, {} to {} (+{} buffer)",
        schedule.total_duration, schedule.start, schedule.end, schedule.buffer_days
    );
    if !schedule.critical_path.is_empty() {
        println!("│   → {}", schedule.critical_path.join(" → "));
    }
    println!(
        "│ Budget       {:.0} (EAC {:.0}, CPI {:.2}, SPI {:.2})",
        budget.baseline, budget.forecast.eac, budget.forecast.cpi, budget.forecast.spi
    );
    println!(
        "│ Resources    {:.0}% → {:.0}% utilization, {} conflicts",
        plan.allocation.original_utilization,
        plan.allocation.optimized_utilization,
        plan.allocation.conflicts.len()
    );
    println!(
        "│ Risk         {:.1} ({}, {})",
        plan.risk.overall_score, plan.risk.level, plan.risk.trend
    );
    if let Some(best) = plan.recommended_alternative() {
        println!("│ Recommended  {}", best.name);
    }
    for concern in &plan.feasibility.concerns {
        println!("│ ⚠ {}", concern);
    }
    println!("└────────────────────────────────────────────────────────────");

    if let Some(report) = report {
        println!("\nReport: {}", report.display());
    }
}
