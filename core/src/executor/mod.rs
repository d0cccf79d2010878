//! Sequential executor for the task dependency graph.
//!
//! # Architecture
//!
//! ```text
//! TaskGraph + RoleRegistry + Parameters
//!   ↓
//! ExecutionEngine::plan() → validate(), roles present, topological order
//!   ↓
//! ExecutionState::new() → roots Ready, the rest Pending
//!   ↓
//! loop: select_next() → resolve_inputs() → RoleRunner (timeout, retries) → ArtifactSink
//!   ↓
//! ExecutionReport
//! ```

mod cancel;
mod engine;
mod progress;
mod prompt;
mod resolve;
mod scheduler;
mod state;
pub mod traits;
pub mod types;
mod validate;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use engine::{ExecutionEngine, ExecutionEngineBuilder};
pub use progress::ProgressMonitor;
pub use prompt::{interpolate, render_prompt};
pub use state::ExecutionState;
pub use types::{
    ExecutionConfig, ExecutionReport, OutputConfig, Parameters, ResolvedInput, RetryConfig,
    TaskOutput, TaskRequest, TaskResult, TaskStatus,
};
pub use validate::parse_structured;
