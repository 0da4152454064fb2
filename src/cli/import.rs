use crate::cli::ImportArgs;
use crate::model::ProjectSnapshot;
use crate::repository::JsonFileRepository;
use crate::timeline::TaskGraph;

pub async fn execute(args: ImportArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;

    let content = std::fs::read_to_string(&args.file)?;
    let snapshot: ProjectSnapshot = serde_json::from_str(&content)?;

    // Refuse snapshots the scheduler would reject anyway
    TaskGraph::build(&snapshot.tasks, &snapshot.dependencies)?.topological_order()?;
    snapshot.check_resource_ids()?;

    let repository = JsonFileRepository::new(&config.data_dir);
    repository.save_snapshot(&snapshot).await?;

    println!(
        "Imported {} ({} tasks, {} resources) into {}",
        snapshot.project.id,
        snapshot.tasks.len(),
        snapshot.resources.len(),
        repository.snapshot_path(&snapshot.project.id).display()
    );
    Ok(())
}
