use crate::cli::SimulateArgs;
use crate::repository::{JsonFileRepository, ProjectRepository};
use crate::risk::{assess_risks, Distribution};
use crate::timeline::compute_schedule;
use tracing::info;

pub async fn execute(args: SimulateArgs) -> anyhow::Result<()> {
    let mut config = args.config.load()?;
    if let Some(iterations) = args.iterations {
        config.risk.simulation_iterations = iterations;
    }
    if let Some(seed) = args.seed {
        config.risk.simulation_seed = seed;
    }

    let repository = JsonFileRepository::new(&config.data_dir);
    let snapshot = repository.fetch_snapshot(&args.project).await?;

    // Cycles disable the simulation; surface them as the scheduling error
    let schedule = compute_schedule(&snapshot, &config)?;
    info!(
        "Simulating {} over {} iterations (seed {})",
        snapshot.project.id, config.risk.simulation_iterations, config.risk.simulation_seed
    );

    let assessment = tokio::task::spawn_blocking(move || assess_risks(&snapshot, &config)).await?;
    let Some(sim) = assessment.simulation else {
        anyhow::bail!("No simulation result for {}", args.project);
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sim)?);
        return Ok(());
    }

    println!(
        "\n{} runs (seed {}), critical path {} days\n",
        sim.iterations, sim.seed, schedule.total_duration
    );
    println!(
        "  {:<10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "", "mean", "p10", "p50", "p90", "max"
    );
    print_row("Duration", &sim.duration);
    print_row("Cost", &sim.cost);
    println!(
        "\n  On time   {:.0}% (deadline {:.0} days)",
        sim.on_time_probability * 100.0,
        sim.deadline_days
    );
    println!(
        "  On budget {:.0}% (limit {:.0})",
        sim.on_budget_probability * 100.0,
        sim.budget_limit
    );

    Ok(())
}

fn print_row(label: &str, d: &Distribution) {
    println!(
        "  {:<10} {:>10.1} {:>10.1} {:>10.1} {:>10.1} {:>10.1}",
        label, d.mean, d.p10, d.p50, d.p90, d.max
    );
}
