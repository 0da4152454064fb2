//! CLI handler for the `track` subcommand
//!
//! Spend against allocation per category, then an earned value forecast
//! measured over the critical path duration.

use crate::budget::{analyze_budget, forecast_for, BudgetHealth};
use crate::cli::TrackArgs;
use crate::repository::{JsonFileRepository, ProjectRepository};
use crate::timeline::compute_schedule;

pub async fn execute(args: TrackArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let repository = JsonFileRepository::new(&config.data_dir);
    let snapshot = repository.fetch_snapshot(&args.project).await?;

    let schedule = compute_schedule(&snapshot, &config)?;
    let mut analysis = analyze_budget(&snapshot, &config);
    if schedule.total_duration > 0 {
        analysis.forecast = forecast_for(
            &snapshot,
            analysis.baseline,
            analysis.performance.total_spent,
            schedule.total_duration,
            &config,
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let performance = &analysis.performance;
    println!(
        "\n{} as of {}\n",
        snapshot.project.name,
        snapshot.as_of()
    );
    println!(
        "  {:<20} {:>12} {:>12} {:>9}  Health",
        "Category", "Allocated", "Spent", "Var %"
    );
    for category in &performance.categories {
        println!(
            "  {:<20} {:>12.0} {:>12.0} {:>8.1}%  {} {}",
            category.name,
            category.allocated,
            category.spent,
            category.variance_percentage,
            health_icon(category.health),
            category.health
        );
    }
    println!(
        "  {:<20} {:>12.0} {:>12.0} {:>8.1}%  {} {}",
        "Total",
        performance.total_allocated,
        performance.total_spent,
        performance.variance_percentage,
        health_icon(performance.health),
        performance.health
    );

    println!("\n  Burn rate {:.0}/day", performance.burn_rate);
    if let Some(runway) = performance.runway_days {
        println!("  Runway    {:.0} days", runway);
    }

    let f = &analysis.forecast;
    println!(
        "\n  BAC {:.0}  PV {:.0}  EV {:.0}  AC {:.0}",
        f.budget_at_completion, f.planned_value, f.earned_value, f.actual_cost
    );
    println!(
        "  CPI {:.2}  SPI {:.2}  EAC {:.0}  ETC {:.0}  VAC {:.0}",
        f.cpi, f.spi, f.eac, f.etc, f.vac
    );
    if let Some(date) = f.projected_completion {
        println!("  Projected completion {}", date);
    }
    if f.over_budget() {
        println!("\n  ⚠ Forecast exceeds the budget by {:.0}", -f.vac);
    }

    Ok(())
}

fn health_icon(health: BudgetHealth) -> &'static str {
    match health {
        BudgetHealth::Good => "✅",
        BudgetHealth::Warning => "⚠️",
        BudgetHealth::Critical => "❌",
    }
}
