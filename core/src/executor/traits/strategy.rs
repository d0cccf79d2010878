use std::time::Duration;

use crate::error::TaskError;
use crate::executor::state::ExecutionState;

/// 重试策略插件
///
/// Only decides how long to wait. Whether to retry at all is decided by the
/// scheduler from the task's retry budget and [`TaskError::is_retryable`].
pub trait RetryStrategyPlugin: Send + Sync {
    fn name(&self) -> &str;
    /// Delay before attempt `attempt + 1`, where `attempt` is the 0-based
    /// attempt that just failed.
    fn next_delay(&self, attempt: u32, error: &TaskError) -> Duration;
}

/// What the coordinator wants to happen next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Run(String),
    Skip(String),
}

impl NextStep {
    pub fn task_id(&self) -> &str {
        match self {
            Self::Run(id) | Self::Skip(id) => id,
        }
    }
}

/// Coordinator hook consulted when the role registry designates a coordinator.
///
/// May only pick among Ready tasks; anything else is ignored and the default
/// choice (earliest declared Ready task) is used instead.
pub trait SchedulingStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn decide_next(&self, state: &ExecutionState) -> Option<NextStep>;
}
