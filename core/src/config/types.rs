use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::executor::ExecutionConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub crew: CrewFilesConfig,

    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub executor: ExecutionConfig,

    #[serde(default)]
    pub manager: ManagerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or ~/.sitecrew/logs if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "warn" or "sitecrew_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Locations of the crew YAML files. `~` is expanded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewFilesConfig {
    #[serde(default = "default_crew_file")]
    pub crew_file: String,
    #[serde(default = "default_agents_file")]
    pub agents_file: String,
    #[serde(default = "default_tasks_file")]
    pub tasks_file: String,
}

fn default_crew_file() -> String {
    "config/crew.yaml".to_string()
}

fn default_agents_file() -> String {
    "config/agents.yaml".to_string()
}

fn default_tasks_file() -> String {
    "config/tasks.yaml".to_string()
}

impl Default for CrewFilesConfig {
    fn default() -> Self {
        Self {
            crew_file: default_crew_file(),
            agents_file: default_agents_file(),
            tasks_file: default_tasks_file(),
        }
    }
}

impl CrewFilesConfig {
    pub fn crew_path(&self) -> PathBuf {
        expand_path(&self.crew_file)
    }

    pub fn agents_path(&self) -> PathBuf {
        expand_path(&self.agents_file)
    }

    pub fn tasks_path(&self) -> PathBuf {
        expand_path(&self.tasks_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "default_artifacts_dir")]
    pub directory: String,
    /// File name of the run summary inside `directory`.
    #[serde(default = "default_summary_file")]
    pub summary_file: String,
}

fn default_artifacts_dir() -> String {
    "artifacts".to_string()
}

fn default_summary_file() -> String {
    "run_summary.json".to_string()
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            directory: default_artifacts_dir(),
            summary_file: default_summary_file(),
        }
    }
}

impl ArtifactsConfig {
    pub fn path(&self) -> PathBuf {
        expand_path(&self.directory)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider")]
pub enum RunnerConfig {
    /// Dry run: describes each task instead of executing it.
    #[serde(rename = "echo")]
    Echo,
    #[serde(rename = "command")]
    Command(CommandRunnerConfig),
    #[serde(rename = "replay")]
    Replay(ReplayRunnerConfig),
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig::Echo
    }
}

/// External agent backend invoked once per attempt. The prompt is written to
/// stdin and stdout is taken as the task output. `{role}` and `{task}` in
/// `args` are substituted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRunnerConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub working_dir: Option<String>,
}

/// Serves recorded outputs from `directory`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRunnerConfig {
    pub directory: String,
}

/// Policy applied by the coordinator strategy when the crew runs with a
/// manager role.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ManagerConfig {
    /// Task ids to run first whenever they are ready, in this order.
    #[serde(default)]
    pub prefer: Vec<String>,
    /// Task ids the coordinator drops without running.
    #[serde(default)]
    pub skip: Vec<String>,
}

pub(crate) fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
