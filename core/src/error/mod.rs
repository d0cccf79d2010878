#[allow(clippy::module_inception)]
pub mod error;
pub mod config;
pub mod executor;

pub use config::ConfigError;
pub use error::{CliError, RunError, RunnerError};
pub use executor::{ExecutorError, GraphError, RoleError, TaskError};
