use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::error::{ExecutorError, TaskError};
use crate::role::{Role, RoleRegistry};
use crate::task::{TaskGraph, TaskSpec};

use super::cancel::CancelSignal;
use super::progress::ProgressMonitor;
use super::prompt::render_prompt;
use super::resolve::{resolve_inputs, ResolveError};
use super::scheduler::select_next;
use super::state::ExecutionState;
use super::traits::{
    ArtifactSink, NextStep, OutputRendererPlugin, RenderEvent, RetryStrategyPlugin, RoleRunner,
    SchedulingStrategy,
};
use super::types::{
    ExecutionReport, Parameters, ResolvedInput, TaskOutput, TaskRequest, TaskResult, TaskStatus,
};
use super::validate::to_output;

/// Outcome of all attempts of one task.
struct Attempts {
    result: Result<TaskOutput, TaskError>,
    attempts: u32,
}

/// Execution engine for task dependency graphs
///
/// Runs at most one task at a time. The graph and registry are borrowed
/// immutably for the whole run.
pub struct ExecutionEngine<'a> {
    graph: &'a TaskGraph,
    roles: &'a RoleRegistry,
    runner: Arc<dyn RoleRunner>,
    sink: Arc<dyn ArtifactSink>,
    renderer: Option<Arc<dyn OutputRendererPlugin>>,
    retry_strategy: Option<Arc<dyn RetryStrategyPlugin>>,
    scheduling_strategy: Option<Arc<dyn SchedulingStrategy>>,
    cancel: CancelSignal,
    progress_bar: bool,
    ascii: bool,
}

pub struct ExecutionEngineBuilder<'a> {
    engine: ExecutionEngine<'a>,
}

impl<'a> ExecutionEngine<'a> {
    pub fn builder(
        graph: &'a TaskGraph,
        roles: &'a RoleRegistry,
        runner: Arc<dyn RoleRunner>,
        sink: Arc<dyn ArtifactSink>,
    ) -> ExecutionEngineBuilder<'a> {
        ExecutionEngineBuilder::new(graph, roles, runner, sink)
    }

    /// Validates the graph against the registry and returns the execution order
    /// without running anything.
    pub fn plan(&self) -> Result<Vec<String>, ExecutorError> {
        self.graph.validate()?;
        for spec in self.graph.tasks() {
            self.roles.get(&spec.role)?;
        }
        Ok(self
            .graph
            .topological_order()
            .map(str::to_string)
            .collect())
    }

    /// Runs the whole graph.
    ///
    /// Returns `Err` only for fatal errors (invalid graph, unknown role, broken
    /// scheduling invariant). Task failures are recorded in the report.
    #[tracing::instrument(name = "run", skip_all, fields(run_id = %run_id))]
    pub async fn execute(
        &self,
        run_id: &str,
        params: &Parameters,
    ) -> Result<ExecutionReport, ExecutorError> {
        let start = Instant::now();

        let order = self.plan()?;
        for name in self.graph.expected_params() {
            if !params.contains_key(name) {
                return Err(ExecutorError::MissingParameter(name.clone()));
            }
        }

        let total_tasks = self.graph.len();
        info!(total_tasks, runner = self.runner.name(), "Starting run");
        self.emit(RenderEvent::RunStart {
            run_id: run_id.to_string(),
            total_tasks,
        });
        self.emit(RenderEvent::Plan {
            run_id: run_id.to_string(),
            order,
        });

        let strategy = match (self.roles.coordinator(), &self.scheduling_strategy) {
            (Some(coordinator), Some(strategy)) => {
                info!(
                    coordinator = %coordinator.id,
                    strategy = strategy.name(),
                    "Coordinator strategy enabled"
                );
                Some(strategy.as_ref())
            }
            _ => None,
        };

        let mut state = ExecutionState::new(self.graph);
        let mut progress = ProgressMonitor::new(total_tasks, self.progress_bar, self.ascii);
        let mut execution_order = Vec::new();
        let mut task_results = Vec::new();
        let mut skipped = Vec::new();
        let mut first_failure: Option<String> = None;
        let mut cancelled = false;

        loop {
            if self.cancel.is_cancelled() {
                warn!("Cancellation requested, not starting further tasks");
                cancelled = true;
                break;
            }

            let Some(step) = select_next(&state, strategy) else {
                break;
            };

            let task_id = match step {
                NextStep::Run(id) => id,
                NextStep::Skip(id) => {
                    info!(task_id = %id, "Coordinator skipped task");
                    state.mark_skipped(&id);
                    progress.skip_task(&id);
                    self.emit(RenderEvent::TaskSkipped {
                        run_id: run_id.to_string(),
                        task_id: id.clone(),
                    });
                    let role = self
                        .graph
                        .get(&id)
                        .map(|s| s.role.clone())
                        .unwrap_or_default();
                    task_results.push(TaskResult {
                        task_id: id.clone(),
                        role,
                        status: TaskStatus::Skipped,
                        output: None,
                        error: None,
                        attempts: 0,
                        retries_used: 0,
                        duration_ms: 0,
                        artifact: None,
                    });
                    skipped.push(id);
                    continue;
                }
            };

            let spec = self
                .graph
                .get(&task_id)
                .ok_or_else(|| ExecutorError::UnknownTask(task_id.clone()))?;
            let role = self.roles.get(&spec.role)?;

            state.mark_running(&task_id);
            execution_order.push(task_id.clone());
            let task_start = Instant::now();

            let outcome = match resolve_inputs(spec, params, &state) {
                Ok(inputs) => {
                    self.run_with_retries(run_id, spec, role, params, inputs, &mut progress)
                        .await
                }
                Err(ResolveError::Fatal(err)) => {
                    error!(task_id = %task_id, error = %err, "Aborting run");
                    progress.finish(false);
                    return Err(err);
                }
                Err(ResolveError::Task(err)) => Attempts {
                    result: Err(err),
                    attempts: 0,
                },
            };

            let mut artifact = None;
            let result = outcome.result.and_then(|output| {
                match self.sink.persist(spec, &output) {
                    Ok(path) => {
                        artifact = Some(path);
                        Ok(output)
                    }
                    Err(e) => Err(TaskError::Sink(e.to_string())),
                }
            });

            let duration_ms = task_start.elapsed().as_millis() as u64;
            let retries_used = outcome.attempts.saturating_sub(1);

            let task_result = match result {
                Ok(output) => {
                    let promoted = state.mark_succeeded(self.graph, &task_id, output.clone());
                    info!(
                        task_id = %task_id,
                        duration_ms,
                        retries_used,
                        ready = ?promoted,
                        "Task succeeded"
                    );
                    TaskResult {
                        task_id: task_id.clone(),
                        role: role.id.clone(),
                        status: TaskStatus::Succeeded,
                        output: Some(output),
                        error: None,
                        attempts: outcome.attempts,
                        retries_used,
                        duration_ms,
                        artifact,
                    }
                }
                Err(err) => {
                    state.mark_failed(&task_id);
                    if err == TaskError::Cancelled {
                        cancelled = true;
                        warn!(task_id = %task_id, "Task cancelled");
                    } else {
                        error!(
                            task_id = %task_id,
                            kind = err.kind(),
                            error = %err,
                            attempts = outcome.attempts,
                            "Task failed"
                        );
                        first_failure.get_or_insert_with(|| task_id.clone());
                    }
                    TaskResult {
                        task_id: task_id.clone(),
                        role: role.id.clone(),
                        status: TaskStatus::Failed,
                        output: None,
                        error: Some(err),
                        attempts: outcome.attempts,
                        retries_used,
                        duration_ms,
                        artifact: None,
                    }
                }
            };

            progress.complete_task(&task_id, task_result.succeeded(), duration_ms);
            self.emit(RenderEvent::TaskComplete {
                run_id: run_id.to_string(),
                result: task_result.clone(),
            });
            task_results.push(task_result);

            if cancelled {
                break;
            }
        }

        let report = ExecutionReport {
            run_id: run_id.to_string(),
            execution_order,
            task_results,
            first_failure,
            pending: state.not_started(),
            skipped,
            cancelled,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        progress.finish(report.succeeded());
        info!(
            ok = report.succeeded(),
            failed = ?report.first_failure,
            pending = report.pending.len(),
            duration_ms = report.duration_ms,
            "Run finished"
        );
        self.emit(RenderEvent::RunEnd {
            run_id: run_id.to_string(),
            report: report.clone(),
        });

        Ok(report)
    }

    async fn run_with_retries(
        &self,
        run_id: &str,
        spec: &TaskSpec,
        role: &Role,
        params: &Parameters,
        inputs: Vec<ResolvedInput>,
        progress: &mut ProgressMonitor,
    ) -> Attempts {
        let max_retries = spec.max_retries.unwrap_or(role.max_retries);
        let timeout = spec.max_execution_time.unwrap_or(role.max_execution_time);
        let base_prompt = render_prompt(role, spec, params, &inputs);

        let mut request = TaskRequest {
            run_id: run_id.to_string(),
            task: spec.clone(),
            role: role.clone(),
            inputs,
            prompt: base_prompt.clone(),
            attempt: 0,
            timeout,
        };

        loop {
            let attempt = request.attempt;
            info!(task_id = %spec.id, role = %role.id, attempt, "Starting task");
            progress.start_task(&spec.id, &role.id, attempt);
            self.emit(RenderEvent::TaskStart {
                run_id: run_id.to_string(),
                task_id: spec.id.clone(),
                role: role.id.clone(),
                attempt,
            });

            let err = match self.attempt_once(&request).await {
                Ok(output) => {
                    return Attempts {
                        result: Ok(output),
                        attempts: attempt + 1,
                    }
                }
                Err(err) => err,
            };

            if attempt >= max_retries || !err.is_retryable(spec.retry_on_validation_failure) {
                return Attempts {
                    result: Err(err),
                    attempts: attempt + 1,
                };
            }

            let delay = self
                .retry_strategy
                .as_ref()
                .map(|s| s.next_delay(attempt, &err))
                .unwrap_or(Duration::ZERO);
            warn!(
                task_id = %spec.id,
                attempt,
                max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying task"
            );
            self.emit(RenderEvent::TaskRetry {
                run_id: run_id.to_string(),
                task_id: spec.id.clone(),
                attempt: attempt + 1,
                error: err.to_string(),
                delay_ms: delay.as_millis() as u64,
            });

            if !delay.is_zero() {
                let mut cancel = self.cancel.clone();
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Attempts { result: Err(TaskError::Cancelled), attempts: attempt + 1 };
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            request.prompt = match &err {
                TaskError::Validation(reason) => format!(
                    "{base_prompt}\nYour previous answer was rejected ({reason}). Reply with the JSON object only.\n"
                ),
                _ => base_prompt.clone(),
            };
            request.attempt += 1;
        }
    }

    /// One attempt, bounded by the task timeout and raced against cancellation.
    /// Dropping the runner future is how a timed-out or cancelled attempt is
    /// terminated.
    async fn attempt_once(&self, request: &TaskRequest) -> Result<TaskOutput, TaskError> {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TaskError::Cancelled),
            outcome = tokio::time::timeout(request.timeout, self.runner.run(request)) => match outcome {
                Err(_) => Err(TaskError::Timeout {
                    ms: request.timeout.as_millis() as u64,
                }),
                Ok(Err(e)) => Err(TaskError::Runner(e.to_string())),
                Ok(Ok(raw)) => to_output(&request.task, raw),
            },
        }
    }

    fn emit(&self, event: RenderEvent) {
        if let Some(renderer) = &self.renderer {
            renderer.render(&event);
        }
    }
}

impl<'a> ExecutionEngineBuilder<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        roles: &'a RoleRegistry,
        runner: Arc<dyn RoleRunner>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            engine: ExecutionEngine {
                graph,
                roles,
                runner,
                sink,
                renderer: None,
                retry_strategy: None,
                scheduling_strategy: None,
                cancel: CancelSignal::never(),
                progress_bar: false,
                ascii: false,
            },
        }
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.engine.renderer = Some(renderer);
        self
    }

    pub fn retry_strategy(mut self, strategy: Arc<dyn RetryStrategyPlugin>) -> Self {
        self.engine.retry_strategy = Some(strategy);
        self
    }

    pub fn scheduling_strategy(mut self, strategy: Arc<dyn SchedulingStrategy>) -> Self {
        self.engine.scheduling_strategy = Some(strategy);
        self
    }

    pub fn cancel_signal(mut self, signal: CancelSignal) -> Self {
        self.engine.cancel = signal;
        self
    }

    pub fn progress_bar(mut self, enabled: bool, ascii: bool) -> Self {
        self.engine.progress_bar = enabled;
        self.engine.ascii = ascii;
        self
    }

    pub fn build(self) -> ExecutionEngine<'a> {
        self.engine
    }
}
