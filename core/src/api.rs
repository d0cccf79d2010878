//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `sitecrew_core::api` instead of reaching into internal modules.

pub use crate::artifacts::ArtifactStore;
pub use crate::config::{
    load, load_default, AppConfig, CommandRunnerConfig, Crew, CrewFilesConfig, LoggingConfig,
    ManagerConfig, Process, ReplayRunnerConfig, RunnerConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::coordinator::{RunCoordinator, RunInput, DEFAULT_WEBSITE_NAME};
pub use crate::error::{
    CliError, ConfigError, ExecutorError, GraphError, RoleError, RunError, RunnerError, TaskError,
};
pub use crate::executor::traits::{
    ArtifactSink, NextStep, OutputRendererPlugin, RenderEvent, RetryStrategyPlugin, RoleRunner,
    SchedulingStrategy,
};
pub use crate::executor::{
    cancel_pair, CancelHandle, CancelSignal, ExecutionConfig, ExecutionEngine, ExecutionReport,
    ExecutionState, OutputConfig, Parameters, ResolvedInput, RetryConfig, TaskOutput, TaskRequest,
    TaskResult, TaskStatus,
};
pub use crate::role::{ExecutionMode, Role, RoleRegistry};
pub use crate::summary::{RunSummary, TaskSummary};
pub use crate::task::{InputSource, OutputRef, TaskGraph, TaskSpec};
