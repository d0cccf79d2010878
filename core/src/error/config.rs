use thiserror::Error;

use super::executor::{GraphError, RoleError};

/// Missing or malformed role/task configuration. Always fatal, raised before execution.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed YAML in {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("malformed TOML in {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("Missing agent config for '{0}'. Check your YAML.")]
    MissingRole(String),

    #[error("Missing task config for '{0}'. Check your YAML.")]
    MissingTask(String),

    #[error("task '{task}' input '{input}': {reason}")]
    InvalidInput {
        task: String,
        input: String,
        reason: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Role(#[from] RoleError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
