use thiserror::Error;

/// Role registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    #[error("Duplicate role ID: {0}")]
    Duplicate(String),

    #[error("Unknown role: {0}")]
    Unknown(String),
}

/// Task graph construction and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate task ID: {0}")]
    DuplicateTask(String),

    #[error("Dangling reference: task '{task_id}' input '{input}' refers to '{reference}'")]
    DanglingReference {
        task_id: String,
        input: String,
        reference: String,
    },

    #[error("Circular dependency detected: {0}")]
    CycleDetected(String),
}

/// Fatal scheduler errors. A run that hits one of these is aborted.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error("Task '{0}' is not part of the graph")]
    UnknownTask(String),

    #[error("Missing value for declared parameter '{0}'")]
    MissingParameter(String),

    #[error("Unresolved input '{input}' for task '{task_id}': upstream '{upstream}' has not succeeded")]
    UnresolvedInput {
        task_id: String,
        input: String,
        upstream: String,
    },
}

/// Per-task failures. These are recovered locally: the task ends Failed and its
/// dependents stay Pending.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("execution timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("structured output validation failed: {0}")]
    Validation(String),

    #[error("runner failed: {0}")]
    Runner(String),

    #[error("input '{input}' needs field '{field}' missing from '{upstream}' output")]
    MissingField {
        input: String,
        upstream: String,
        field: String,
    },

    #[error("failed to write artifact: {0}")]
    Sink(String),

    #[error("cancelled")]
    Cancelled,
}

impl TaskError {
    /// Whether another attempt could change the outcome, given the task's retry flags.
    pub fn is_retryable(&self, retry_on_validation_failure: bool) -> bool {
        match self {
            Self::Timeout { .. } | Self::Runner(_) => true,
            Self::Validation(_) => retry_on_validation_failure,
            Self::MissingField { .. } | Self::Sink(_) | Self::Cancelled => false,
        }
    }

    /// Short machine-friendly kind, used in events and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Validation(_) => "validation",
            Self::Runner(_) => "runner",
            Self::MissingField { .. } => "missing_field",
            Self::Sink(_) => "sink",
            Self::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_retry_follows_task_flag() {
        let err = TaskError::Validation("not an object".into());
        assert!(err.is_retryable(true));
        assert!(!err.is_retryable(false));
    }

    #[test]
    fn timeouts_always_retryable() {
        assert!(TaskError::Timeout { ms: 3000 }.is_retryable(false));
        assert!(!TaskError::Cancelled.is_retryable(true));
    }
}
