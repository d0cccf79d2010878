//! ServicesFactory implementation: builds runner, renderer and strategies from
//! configuration so the CLI and tests share one wiring.
use async_trait::async_trait;
use sitecrew_core::api::{AppConfig, RunError, Services, ServicesFactory};
use tracing::debug;

use crate::factory;

pub struct PluginServicesFactory {
    text_events: bool,
}

impl PluginServicesFactory {
    /// Whether text-format runs print one line per event. Interactive runs
    /// turn this off and rely on progress bars.
    pub fn with_text_events(mut self, enabled: bool) -> Self {
        self.text_events = enabled;
        self
    }
}

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self { text_events: true }
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunError> {
        let runner = factory::build_runner(&cfg.runner)?;
        let renderer = factory::build_renderer(&cfg.executor.output, self.text_events);
        let retry_strategy = factory::build_retry_strategy(&cfg.executor.retry);
        let scheduling_strategy = factory::build_scheduling_strategy(&cfg.manager);
        debug!(
            runner = runner.name(),
            retry = retry_strategy.name(),
            manager = scheduling_strategy.is_some(),
            "Services built"
        );
        Ok(Services {
            runner,
            renderer,
            retry_strategy: Some(retry_strategy),
            scheduling_strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_dry_run() {
        let services = PluginServicesFactory::default()
            .build_services(&AppConfig::default())
            .await
            .unwrap();
        assert_eq!(services.runner.name(), "echo");
        assert!(services.renderer.is_some());
        assert!(services.retry_strategy.is_some());
        assert!(services.scheduling_strategy.is_none());
    }

    #[tokio::test]
    async fn quiet_text_has_no_renderer() {
        let services = PluginServicesFactory::default()
            .with_text_events(false)
            .build_services(&AppConfig::default())
            .await
            .unwrap();
        assert!(services.renderer.is_none());
    }
}
