use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::RunError;
use crate::executor::traits::{
    OutputRendererPlugin, RetryStrategyPlugin, RoleRunner, SchedulingStrategy,
};

/// Pluggable collaborators of one run.
#[derive(Clone)]
pub struct Services {
    pub runner: Arc<dyn RoleRunner>,
    pub renderer: Option<Arc<dyn OutputRendererPlugin>>,
    pub retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    /// Only consulted when the crew designates a manager role.
    pub scheduling_strategy: Option<Arc<dyn SchedulingStrategy>>,
}

impl Services {
    pub fn new(runner: Arc<dyn RoleRunner>) -> Self {
        Self {
            runner,
            renderer: None,
            retry_strategy: None,
            scheduling_strategy: None,
        }
    }
}

#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub async fn build_services(&self) -> Result<Services, RunError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(RunError::Services(
                "services_factory missing (cannot build plugins/services)".into(),
            ));
        };
        factory.build_services(&self.cfg).await
    }
}
