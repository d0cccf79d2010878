use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::AppConfig;

pub const ENV_ARTIFACTS_DIR: &str = "SITECREW_ARTIFACTS_DIR";
pub const ENV_LOG_LEVEL: &str = "SITECREW_LOG_LEVEL";

/// Get the default sitecrew data directory: ~/.sitecrew
pub fn get_sitecrew_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".sitecrew"))
        .ok_or_else(|| ConfigError::Invalid("Cannot determine home directory".into()))
}

/// Reads and parses one TOML file.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|source| ConfigError::Toml {
        path: path.display().to_string(),
        source,
    })
}

/// Loads the application config.
///
/// Priority: `explicit` path, then ~/.sitecrew/config.toml, then
/// ./sitecrew.toml, then built-in defaults. Environment overrides are applied
/// last. An explicit path that does not exist is an error.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut cfg = match explicit {
        Some(path) => load_from(path)?,
        None => {
            let user_config = get_sitecrew_data_dir()
                .ok()
                .map(|dir| dir.join("config.toml"))
                .filter(|p| p.exists());
            let local_config = Path::new("sitecrew.toml");

            if let Some(path) = user_config {
                load_from(&path)?
            } else if local_config.exists() {
                load_from(local_config)?
            } else {
                AppConfig::default()
            }
        }
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());

    if cfg.logging.file && cfg.logging.directory.as_deref().map_or(true, |d| d.trim().is_empty()) {
        if let Ok(dir) = get_sitecrew_data_dir() {
            cfg.logging.directory = Some(dir.join("logs").to_string_lossy().to_string());
        }
    }

    Ok(cfg)
}

pub fn load_default() -> Result<AppConfig, ConfigError> {
    load(None)
}

/// Environment variable overrides (highest priority). Blank values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_blank(ENV_ARTIFACTS_DIR) {
        cfg.artifacts.directory = v;
    }
    if let Some(v) = non_blank(ENV_LOG_LEVEL) {
        cfg.logging.level = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn explicit_file_is_used() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[artifacts]\ndirectory = \"out\"").unwrap();

        let cfg = load(Some(file.path())).unwrap();
        assert_eq!(cfg.artifacts.directory, "out");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_toml_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[artifacts\ndirectory = 3").unwrap();
        let err = load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn repository_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../sitecrew.toml");
        let cfg = load_from(&path).unwrap();
        assert!(matches!(cfg.runner, crate::config::RunnerConfig::Echo));
        assert_eq!(cfg.executor.retry.strategy, "exponential-backoff");
        assert_eq!(cfg.crew.tasks_file, "config/tasks.yaml");
    }

    #[test]
    fn env_overrides_win_and_skip_blanks() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_ARTIFACTS_DIR, "/tmp/site"), (ENV_LOG_LEVEL, "  ")]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.artifacts.directory, "/tmp/site");
        assert_eq!(cfg.logging.level, "warn");
    }
}
