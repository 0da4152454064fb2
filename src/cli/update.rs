use crate::cli::plan::print_plan;
use crate::cli::UpdateArgs;
use crate::output::{write_plan_report, write_summary};
use crate::planner::{PlanUpdate, ProjectPlanner};
use crate::repository::{JsonFileRepository, ProjectRepository};
use std::sync::Arc;
use tracing::info;

pub async fn execute(args: UpdateArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let repository = Arc::new(JsonFileRepository::new(&config.data_dir));

    let version = match args.from_version {
        Some(version) => version,
        None => repository.latest_version(&args.project).await?,
    };
    if version == 0 {
        anyhow::bail!(
            "No stored plan for {}. Run `planforge plan {}` first",
            args.project,
            args.project
        );
    }
    let base = repository.load_plan(&args.project, version).await?;

    let content = std::fs::read_to_string(&args.changes)?;
    let changes: PlanUpdate = serde_json::from_str(&content)?;
    if changes.is_empty() {
        anyhow::bail!("{} contains no changes", args.changes.display());
    }

    info!("Updating {} from v{}", args.project, version);
    let report_dir = config.report_dir.clone();
    let planner = ProjectPlanner::new(config, repository);
    let plan = planner.update(&base, &changes, base.options).await?;

    let report = write_plan_report(&report_dir, &plan)?;
    write_summary(&report_dir, &plan)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan, Some(&report));
    }
    Ok(())
}
