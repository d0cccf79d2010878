use std::sync::Arc;

use sitecrew_core::api::{
    ManagerConfig, OutputConfig, OutputRendererPlugin, RetryConfig, RetryStrategyPlugin,
    RoleRunner, RunError, RunnerConfig, SchedulingStrategy,
};

use crate::executor::{
    ExponentialBackoffPlugin, JsonlRendererPlugin, LinearRetryPlugin, ManagerStrategy,
    NoDelayRetryPlugin, TextRendererPlugin,
};
use crate::runner::{CommandRunnerPlugin, EchoRunnerPlugin, ReplayRunnerPlugin};

pub fn build_runner(cfg: &RunnerConfig) -> Result<Arc<dyn RoleRunner>, RunError> {
    match cfg {
        RunnerConfig::Echo => Ok(Arc::new(EchoRunnerPlugin::new())),
        RunnerConfig::Command(c_cfg) => {
            if c_cfg.program.trim().is_empty() {
                return Err(RunError::Services(
                    "runner.program must name an executable".to_string(),
                ));
            }
            Ok(Arc::new(CommandRunnerPlugin::new(c_cfg.clone())))
        }
        RunnerConfig::Replay(r_cfg) => Ok(Arc::new(ReplayRunnerPlugin::new(
            shellexpand::tilde(&r_cfg.directory).into_owned(),
        ))),
    }
}

/// `None` for text output when `text_events` is off, i.e. when progress bars
/// already cover the terminal.
pub fn build_renderer(
    output: &OutputConfig,
    text_events: bool,
) -> Option<Arc<dyn OutputRendererPlugin>> {
    match output.format.as_str() {
        "jsonl" => Some(Arc::new(JsonlRendererPlugin::new(false))),
        // Anything other than jsonl behaves like text.
        _ if text_events => Some(Arc::new(TextRendererPlugin::new(output.ascii_only))),
        _ => None,
    }
}

pub fn build_retry_strategy(cfg: &RetryConfig) -> Arc<dyn RetryStrategyPlugin> {
    match cfg.strategy.as_str() {
        "linear" => Arc::new(LinearRetryPlugin::new(cfg.clone())),
        "none" => Arc::new(NoDelayRetryPlugin),
        _ => Arc::new(ExponentialBackoffPlugin::new(cfg.clone())),
    }
}

pub fn build_scheduling_strategy(cfg: &ManagerConfig) -> Option<Arc<dyn SchedulingStrategy>> {
    let strategy = ManagerStrategy::new(cfg);
    if strategy.is_passive() {
        return None;
    }
    Some(Arc::new(strategy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecrew_core::api::CommandRunnerConfig;
    use std::collections::BTreeMap;

    #[test]
    fn runner_follows_provider() {
        assert_eq!(build_runner(&RunnerConfig::Echo).unwrap().name(), "echo");

        let cmd = RunnerConfig::Command(CommandRunnerConfig {
            program: "agent-cli".into(),
            args: vec!["--role".into(), "{role}".into()],
            env: BTreeMap::new(),
            working_dir: None,
        });
        assert_eq!(build_runner(&cmd).unwrap().name(), "command");
    }

    #[test]
    fn empty_program_is_rejected() {
        let cmd = RunnerConfig::Command(CommandRunnerConfig {
            program: "  ".into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
        });
        assert!(matches!(build_runner(&cmd), Err(RunError::Services(_))));
    }

    #[test]
    fn renderer_selection() {
        let mut output = OutputConfig::default();
        assert_eq!(build_renderer(&output, true).unwrap().format(), "text");
        assert!(build_renderer(&output, false).is_none());

        output.format = "jsonl".into();
        assert_eq!(build_renderer(&output, false).unwrap().format(), "jsonl");
    }

    #[test]
    fn retry_strategy_selection() {
        let mut cfg = RetryConfig::default();
        assert_eq!(build_retry_strategy(&cfg).name(), "exponential-backoff");
        cfg.strategy = "linear".into();
        assert_eq!(build_retry_strategy(&cfg).name(), "linear");
        cfg.strategy = "none".into();
        assert_eq!(build_retry_strategy(&cfg).name(), "none");
    }

    #[test]
    fn passive_manager_builds_no_strategy() {
        assert!(build_scheduling_strategy(&ManagerConfig::default()).is_none());
        let cfg = ManagerConfig {
            prefer: vec!["backend_developer_task".into()],
            skip: Vec::new(),
        };
        assert_eq!(build_scheduling_strategy(&cfg).unwrap().name(), "manager");
    }
}
