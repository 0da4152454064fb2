//! Persistence collaborator for the planner
//!
//! The planner only talks to `ProjectRepository`. Two implementations ship:
//! an in-memory store for tests and embedding, and a JSON file store laid out
//! as `<dir>/<project>.json` for input snapshots and
//! `<dir>/plans/<project>/v<N>.json` for stored plans.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::RepositoryError;
use crate::model::{
    BudgetCategory, Dependency, Expense, Milestone, Phase, Project, ProjectSnapshot, Resource,
    ResourceAssignment, Task,
};
use crate::planner::ComprehensivePlan;

const PLANS_DIR: &str = "plans";

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn fetch_project(&self, project_id: &str) -> Result<Project, RepositoryError>;

    async fn fetch_tasks(&self, project_id: &str) -> Result<Vec<Task>, RepositoryError>;

    async fn fetch_dependencies(&self, project_id: &str)
        -> Result<Vec<Dependency>, RepositoryError>;

    async fn fetch_resources(&self, project_id: &str) -> Result<Vec<Resource>, RepositoryError>;

    async fn fetch_assignments(
        &self,
        project_id: &str,
    ) -> Result<Vec<ResourceAssignment>, RepositoryError>;

    async fn fetch_budgets(&self, project_id: &str)
        -> Result<Vec<BudgetCategory>, RepositoryError>;

    async fn fetch_expenses(&self, project_id: &str) -> Result<Vec<Expense>, RepositoryError>;

    async fn fetch_phases(&self, project_id: &str) -> Result<Vec<Phase>, RepositoryError>;

    async fn fetch_milestones(&self, project_id: &str) -> Result<Vec<Milestone>, RepositoryError>;

    /// Highest stored plan version, 0 when none exists
    async fn latest_version(&self, project_id: &str) -> Result<u32, RepositoryError>;

    async fn store_plan(&self, plan: &ComprehensivePlan) -> Result<(), RepositoryError>;

    /// Fetch every input of one planning pass. Risk history and the previous
    /// score are not part of the record contract and stay empty unless an
    /// implementation overrides this.
    async fn fetch_snapshot(&self, project_id: &str) -> Result<ProjectSnapshot, RepositoryError> {
        let project = self.fetch_project(project_id).await?;
        let (tasks, dependencies, resources, assignments) = tokio::try_join!(
            self.fetch_tasks(project_id),
            self.fetch_dependencies(project_id),
            self.fetch_resources(project_id),
            self.fetch_assignments(project_id),
        )?;
        let (budgets, expenses, phases, milestones) = tokio::try_join!(
            self.fetch_budgets(project_id),
            self.fetch_expenses(project_id),
            self.fetch_phases(project_id),
            self.fetch_milestones(project_id),
        )?;

        let mut snapshot = ProjectSnapshot::new(project);
        snapshot.tasks = tasks;
        snapshot.dependencies = dependencies;
        snapshot.resources = resources;
        snapshot.assignments = assignments;
        snapshot.budgets = budgets;
        snapshot.expenses = expenses;
        snapshot.phases = phases;
        snapshot.milestones = milestones;
        Ok(snapshot)
    }
}

/// Repository over snapshots held in memory
#[derive(Default)]
pub struct InMemoryRepository {
    snapshots: RwLock<HashMap<String, ProjectSnapshot>>,
    plans: RwLock<HashMap<String, Vec<ComprehensivePlan>>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, snapshot: ProjectSnapshot) {
        self.snapshots
            .write()
            .await
            .insert(snapshot.project.id.clone(), snapshot);
    }

    pub async fn plans(&self, project_id: &str) -> Vec<ComprehensivePlan> {
        self.plans
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn read<T: Send>(
        &self,
        project_id: &str,
        pick: impl FnOnce(&ProjectSnapshot) -> T + Send,
    ) -> Result<T, RepositoryError> {
        let guard = self.snapshots.read().await;
        guard
            .get(project_id)
            .map(pick)
            .ok_or_else(|| RepositoryError::ProjectNotFound(project_id.to_string()))
    }
}

#[async_trait]
impl ProjectRepository for InMemoryRepository {
    async fn fetch_project(&self, project_id: &str) -> Result<Project, RepositoryError> {
        self.read(project_id, |s| s.project.clone()).await
    }

    async fn fetch_tasks(&self, project_id: &str) -> Result<Vec<Task>, RepositoryError> {
        self.read(project_id, |s| s.tasks.clone()).await
    }

    async fn fetch_dependencies(
        &self,
        project_id: &str,
    ) -> Result<Vec<Dependency>, RepositoryError> {
        self.read(project_id, |s| s.dependencies.clone()).await
    }

    async fn fetch_resources(&self, project_id: &str) -> Result<Vec<Resource>, RepositoryError> {
        self.read(project_id, |s| s.resources.clone()).await
    }

    async fn fetch_assignments(
        &self,
        project_id: &str,
    ) -> Result<Vec<ResourceAssignment>, RepositoryError> {
        self.read(project_id, |s| s.assignments.clone()).await
    }

    async fn fetch_budgets(
        &self,
        project_id: &str,
    ) -> Result<Vec<BudgetCategory>, RepositoryError> {
        self.read(project_id, |s| s.budgets.clone()).await
    }

    async fn fetch_expenses(&self, project_id: &str) -> Result<Vec<Expense>, RepositoryError> {
        self.read(project_id, |s| s.expenses.clone()).await
    }

    async fn fetch_phases(&self, project_id: &str) -> Result<Vec<Phase>, RepositoryError> {
        self.read(project_id, |s| s.phases.clone()).await
    }

    async fn fetch_milestones(&self, project_id: &str) -> Result<Vec<Milestone>, RepositoryError> {
        self.read(project_id, |s| s.milestones.clone()).await
    }

    async fn latest_version(&self, project_id: &str) -> Result<u32, RepositoryError> {
        Ok(self
            .plans
            .read()
            .await
            .get(project_id)
            .and_then(|plans| plans.iter().map(|p| p.version).max())
            .unwrap_or(0))
    }

    async fn store_plan(&self, plan: &ComprehensivePlan) -> Result<(), RepositoryError> {
        self.plans
            .write()
            .await
            .entry(plan.project_id.clone())
            .or_default()
            .push(plan.clone());
        Ok(())
    }

    async fn fetch_snapshot(&self, project_id: &str) -> Result<ProjectSnapshot, RepositoryError> {
        self.read(project_id, ProjectSnapshot::clone).await
    }
}

/// Repository over JSON files in a data directory
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_path(&self, project_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", project_id))
    }

    pub fn plan_dir(&self, project_id: &str) -> PathBuf {
        self.root.join(PLANS_DIR).join(project_id)
    }

    pub fn plan_path(&self, project_id: &str, version: u32) -> PathBuf {
        self.plan_dir(project_id).join(format!("v{}.json", version))
    }

    /// Write an input snapshot, replacing any previous one
    pub async fn save_snapshot(&self, snapshot: &ProjectSnapshot) -> Result<(), RepositoryError> {
        let path = self.snapshot_path(&snapshot.project.id);
        write_json(&path, snapshot).await
    }

    pub async fn load_plan(
        &self,
        project_id: &str,
        version: u32,
    ) -> Result<ComprehensivePlan, RepositoryError> {
        let path = self.plan_path(project_id, version);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| RepositoryError::Io { path, source })?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn load(&self, project_id: &str) -> Result<ProjectSnapshot, RepositoryError> {
        let path = self.snapshot_path(project_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::ProjectNotFound(project_id.to_string()));
            }
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };
        debug!("Loaded snapshot {}", path.display());
        Ok(serde_json::from_str(&content)?)
    }
}

async fn write_json<T: serde::Serialize>(
    path: &Path,
    value: &T,
) -> Result<(), RepositoryError> {
    let json = serde_json::to_string_pretty(value)?;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || replace_file(&path, json.as_bytes()))
        .await
        .map_err(|e| RepositoryError::Unavailable(e.to_string()))?
}

/// Write to a sibling temp file and rename it over `path`, so readers see
/// either the old contents or the new ones.
fn replace_file(path: &Path, contents: &[u8]) -> Result<(), RepositoryError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|source| RepositoryError::Io {
        path: parent.to_path_buf(),
        source,
    })?;

    let io = |source: std::io::Error| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = NamedTempFile::new_in(parent).map_err(io)?;
    file.write_all(contents).map_err(io)?;
    file.as_file().sync_all().map_err(io)?;
    file.persist(path).map_err(|e| io(e.error))?;
    Ok(())
}

#[async_trait]
impl ProjectRepository for JsonFileRepository {
    async fn fetch_project(&self, project_id: &str) -> Result<Project, RepositoryError> {
        Ok(self.load(project_id).await?.project)
    }

    async fn fetch_tasks(&self, project_id: &str) -> Result<Vec<Task>, RepositoryError> {
        Ok(self.load(project_id).await?.tasks)
    }

    async fn fetch_dependencies(
        &self,
        project_id: &str,
    ) -> Result<Vec<Dependency>, RepositoryError> {
        Ok(self.load(project_id).await?.dependencies)
    }

    async fn fetch_resources(&self, project_id: &str) -> Result<Vec<Resource>, RepositoryError> {
        Ok(self.load(project_id).await?.resources)
    }

    async fn fetch_assignments(
        &self,
        project_id: &str,
    ) -> Result<Vec<ResourceAssignment>, RepositoryError> {
        Ok(self.load(project_id).await?.assignments)
    }

    async fn fetch_budgets(
        &self,
        project_id: &str,
    ) -> Result<Vec<BudgetCategory>, RepositoryError> {
        Ok(self.load(project_id).await?.budgets)
    }

    async fn fetch_expenses(&self, project_id: &str) -> Result<Vec<Expense>, RepositoryError> {
        Ok(self.load(project_id).await?.expenses)
    }

    async fn fetch_phases(&self, project_id: &str) -> Result<Vec<Phase>, RepositoryError> {
        Ok(self.load(project_id).await?.phases)
    }

    async fn fetch_milestones(&self, project_id: &str) -> Result<Vec<Milestone>, RepositoryError> {
        Ok(self.load(project_id).await?.milestones)
    }

    async fn latest_version(&self, project_id: &str) -> Result<u32, RepositoryError> {
        let dir = self.plan_dir(project_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(RepositoryError::Io { path: dir, source }),
        };

        let mut latest = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| RepositoryError::Io {
                path: dir.clone(),
                source,
            })?
        {
            let name = entry.file_name();
            let version = name
                .to_str()
                .and_then(|n| n.strip_prefix('v'))
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(version) = version {
                latest = latest.max(version);
            }
        }
        Ok(latest)
    }

    async fn store_plan(&self, plan: &ComprehensivePlan) -> Result<(), RepositoryError> {
        let path = self.plan_path(&plan.project_id, plan.version);
        write_json(&path, plan).await?;
        debug!("Stored plan v{} at {}", plan.version, path.display());
        Ok(())
    }

    /// One file read carries the whole snapshot, including risk history
    async fn fetch_snapshot(&self, project_id: &str) -> Result<ProjectSnapshot, RepositoryError> {
        self.load(project_id).await
    }
}
