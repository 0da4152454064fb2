use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Fatal input errors that stop a planning pass before any analyzer runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Circular dependency detected at task '{task_id}'")]
    CircularDependency { task_id: String },

    #[error("Duplicate task id '{0}'")]
    DuplicateTask(String),

    #[error("Duplicate resource id '{0}'")]
    DuplicateResource(String),

    #[error("Task '{task_id}' is scheduled beyond the supported calendar")]
    BeyondCalendar { task_id: String },
}

/// Failures of the external persistence collaborator.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Project '{0}' not found")]
    ProjectNotFound(String),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),

    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("Invalid risk status transition for '{risk_id}' from {from} to {to}")]
    InvalidTransition {
        risk_id: String,
        from: String,
        to: String,
    },
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Planning pass exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Analyzer task failed: {0}")]
    Join(String),
}

impl PlannerError {
    /// I/O failures can be retried without re-deriving anything. Algorithmic
    /// and decode errors fail the same way on the same input.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlannerError::Repository(
                RepositoryError::ProjectNotFound(_) | RepositoryError::Serialize(_),
            ) => false,
            PlannerError::Repository(_) | PlannerError::DeadlineExceeded(_) => true,
            PlannerError::Schedule(_) | PlannerError::Join(_) => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_names_task() {
        let err = ScheduleError::CircularDependency {
            task_id: "api".to_string(),
        };
        assert_eq!(err.to_string(), "Circular dependency detected at task 'api'");
    }

    #[test]
    fn test_retryable_split() {
        let io = PlannerError::Repository(RepositoryError::Unavailable("down".into()));
        assert!(io.is_retryable());

        let cycle = PlannerError::Schedule(ScheduleError::CircularDependency {
            task_id: "a".into(),
        });
        assert!(!cycle.is_retryable());

        let missing = PlannerError::Repository(RepositoryError::ProjectNotFound("p".into()));
        assert!(!missing.is_retryable());

        let corrupt = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!PlannerError::Repository(corrupt.into()).is_retryable());
    }
}
