mod crew;
mod load;
mod types;

pub use crew::{CrewDefinition, Crew, Process, RoleConfig, TaskConfig};
pub use load::{
    apply_env_overrides, get_sitecrew_data_dir, load, load_default, load_from, ENV_ARTIFACTS_DIR,
    ENV_LOG_LEVEL,
};
pub use types::{
    AppConfig, ArtifactsConfig, CommandRunnerConfig, CrewFilesConfig, LoggingConfig,
    ManagerConfig, ReplayRunnerConfig, RunnerConfig,
};
