use std::path::PathBuf;

use serde::Serialize;

use crate::error::TaskError;

use super::task::TaskOutput;

/// Lifecycle state of a task within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Ready,
    Running,
    Succeeded,
    Failed,
    /// Dropped by the coordinator; never executed.
    Skipped,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Result of executing a single task
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub task_id: String,
    pub role: String,
    pub status: TaskStatus,
    pub output: Option<TaskOutput>,
    pub error: Option<TaskError>,
    /// Attempts actually started (0 when the task never reached the runner).
    pub attempts: u32,
    pub retries_used: u32,
    pub duration_ms: u64,
    /// Where the output was persisted.
    pub artifact: Option<PathBuf>,
}

impl TaskResult {
    pub fn succeeded(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }
}

/// Result of executing a task graph
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub run_id: String,
    /// Task ids in the order they were started.
    pub execution_order: Vec<String>,
    /// One entry per finished or skipped task, in execution order.
    pub task_results: Vec<TaskResult>,
    pub first_failure: Option<String>,
    /// Tasks that never ran, in declaration order.
    pub pending: Vec<String>,
    pub skipped: Vec<String>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> bool {
        !self.cancelled && self.first_failure.is_none() && self.pending.is_empty()
    }

    pub fn result(&self, task_id: &str) -> Option<&TaskResult> {
        self.task_results.iter().find(|r| r.task_id == task_id)
    }

    /// Output of the last task that succeeded.
    pub fn final_output(&self) -> Option<&TaskOutput> {
        self.task_results
            .iter()
            .rev()
            .filter(|r| r.succeeded())
            .find_map(|r| r.output.as_ref())
    }
}
