use thiserror::Error;

use super::config::ConfigError;
use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("run failed: {0}")]
    Run(#[from] RunError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised by the run coordinator before or around scheduling.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("artifact io error at {path}: {source}")]
    ArtifactIo {
        path: String,
        source: std::io::Error,
    },
    #[error("services unavailable: {0}")]
    Services(String),
}

/// Errors produced by a role runner while executing one attempt of a task.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("runner io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend exited with status {code}: {stderr}")]
    Exit { code: i32, stderr: String },
    #[error("no recorded output for task '{0}'")]
    MissingRecording(String),
    #[error("runner error: {0}")]
    Other(String),
}
