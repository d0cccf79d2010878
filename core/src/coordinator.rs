//! Top-level driver of one pipeline run.

use std::sync::Arc;

use chrono::{Datelike, Local, Utc};
use tracing::{error, info};
use uuid::Uuid;

use crate::artifacts::ArtifactStore;
use crate::config::Crew;
use crate::context::AppContext;
use crate::error::RunError;
use crate::executor::traits::ArtifactSink;
use crate::executor::{CancelSignal, ExecutionEngine, ExecutionReport, Parameters};
use crate::summary::RunSummary;

pub const DEFAULT_WEBSITE_NAME: &str = "Generated Website";

/// External input of one run.
#[derive(Debug, Clone, Default)]
pub struct RunInput {
    pub request: String,
    pub name: Option<String>,
    /// Applied last; may replace any seeded parameter.
    pub overrides: Parameters,
}

impl RunInput {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// `customer_request`, `website_name` and `current_year`, then overrides.
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("customer_request".into(), self.request.clone());
        params.insert(
            "website_name".into(),
            self.name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .unwrap_or(DEFAULT_WEBSITE_NAME)
                .to_string(),
        );
        params.insert("current_year".into(), Local::now().year().to_string());
        params.extend(self.overrides.clone());
        params
    }
}

pub struct RunCoordinator {
    ctx: AppContext,
    cancel: CancelSignal,
    progress_bar: bool,
}

impl RunCoordinator {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            cancel: CancelSignal::never(),
            progress_bar: false,
        }
    }

    pub fn with_cancel_signal(mut self, signal: CancelSignal) -> Self {
        self.cancel = signal;
        self
    }

    pub fn with_progress_bar(mut self, enabled: bool) -> Self {
        self.progress_bar = enabled;
        self
    }

    pub fn load_crew(&self) -> Result<Crew, RunError> {
        Ok(Crew::load(&self.ctx.cfg().crew)?)
    }

    /// Loads the crew from the configured files and runs it.
    ///
    /// Configuration errors do not surface as `Err`: they become a failure
    /// summary, which is persisted like any other. `Err` means the summary
    /// itself could not be written.
    pub async fn run(&self, input: &RunInput) -> Result<RunSummary, RunError> {
        match self.load_crew() {
            Ok(crew) => self.drive(Ok(&crew), input).await,
            Err(err) => self.drive(Err(err), input).await,
        }
    }

    /// Runs an already built crew.
    pub async fn run_crew(&self, crew: &Crew, input: &RunInput) -> Result<RunSummary, RunError> {
        self.drive(Ok(crew), input).await
    }

    async fn drive(
        &self,
        crew: Result<&Crew, RunError>,
        input: &RunInput,
    ) -> Result<RunSummary, RunError> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();
        let params = input.parameters();
        // Overrides may replace the seeded values; report what the tasks saw.
        let request = params
            .get("customer_request")
            .cloned()
            .unwrap_or_else(|| input.request.clone());
        let name = params
            .get("website_name")
            .cloned()
            .unwrap_or_else(|| DEFAULT_WEBSITE_NAME.to_string());

        let store = ArtifactStore::new(self.ctx.cfg().artifacts.path());
        let artifacts_dir = store.root().display().to_string();
        store.ensure_dir().map_err(|source| RunError::ArtifactIo {
            path: artifacts_dir.clone(),
            source,
        })?;

        let outcome = match crew {
            Ok(crew) => self.execute(crew, &run_id, &params, &store).await,
            Err(err) => Err(err),
        };

        let summary = match outcome {
            Ok(report) => RunSummary::from_report(
                &report,
                &params,
                &request,
                &name,
                &artifacts_dir,
                started_at,
            ),
            Err(err) => {
                error!(run_id = %run_id, error = %err, "Run aborted");
                RunSummary::failure(
                    &run_id,
                    &params,
                    &request,
                    &name,
                    &artifacts_dir,
                    &err,
                    started_at,
                )
            }
        };

        let summary_file = &self.ctx.cfg().artifacts.summary_file;
        let path = store
            .write_summary(summary_file, &summary)
            .map_err(|source| RunError::ArtifactIo {
                path: store.root().join(summary_file).display().to_string(),
                source,
            })?;
        info!(run_id = %run_id, ok = summary.ok, summary = %path.display(), "Run summary written");

        Ok(summary)
    }

    async fn execute(
        &self,
        crew: &Crew,
        run_id: &str,
        params: &Parameters,
        store: &ArtifactStore,
    ) -> Result<ExecutionReport, RunError> {
        let services = self.ctx.build_services().await?;
        let output = &self.ctx.cfg().executor.output;
        let sink: Arc<dyn ArtifactSink> = Arc::new(store.clone());

        let mut builder =
            ExecutionEngine::builder(&crew.graph, &crew.roles, services.runner.clone(), sink)
                .cancel_signal(self.cancel.clone())
                .progress_bar(self.progress_bar && output.progress_bar, output.ascii_only);
        if let Some(renderer) = services.renderer {
            builder = builder.renderer(renderer);
        }
        if let Some(retry) = services.retry_strategy {
            builder = builder.retry_strategy(retry);
        }
        if let Some(strategy) = services.scheduling_strategy {
            builder = builder.scheduling_strategy(strategy);
        }

        Ok(builder.build().execute(run_id, params).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_defaults_then_overrides() {
        let params = RunInput::new("A bakery site").parameters();
        assert_eq!(params["customer_request"], "A bakery site");
        assert_eq!(params["website_name"], DEFAULT_WEBSITE_NAME);
        assert_eq!(params["current_year"], Local::now().year().to_string());

        let params = RunInput::new("A bakery site")
            .with_name("  ")
            .with_override("current_year", "1999")
            .with_override("audience", "families")
            .parameters();
        assert_eq!(params["website_name"], DEFAULT_WEBSITE_NAME);
        assert_eq!(params["current_year"], "1999");
        assert_eq!(params["audience"], "families");
    }

    #[tokio::test]
    async fn config_error_still_writes_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = crate::config::AppConfig::default();
        cfg.artifacts.directory = dir.path().join("out").display().to_string();
        cfg.crew.crew_file = dir.path().join("missing.yaml").display().to_string();

        let coordinator = RunCoordinator::new(AppContext::new(cfg, None));
        let summary = coordinator.run(&RunInput::new("anything")).await.unwrap();

        assert!(!summary.ok);
        assert!(summary.error.as_deref().unwrap().contains("missing.yaml"));
        assert!(dir.path().join("out/run_summary.json").exists());
    }

    #[tokio::test]
    async fn summary_reports_overridden_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = crate::config::AppConfig::default();
        cfg.artifacts.directory = dir.path().display().to_string();
        cfg.crew.crew_file = dir.path().join("missing.yaml").display().to_string();

        let input = RunInput::new("A bakery site")
            .with_override("customer_request", "A florist site");
        let summary = RunCoordinator::new(AppContext::new(cfg, None))
            .run(&input)
            .await
            .unwrap();

        assert_eq!(summary.request, "A florist site");
        assert_eq!(summary.parameters["customer_request"], "A florist site");
    }
}
