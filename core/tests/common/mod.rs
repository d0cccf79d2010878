#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use sitecrew_core::api::{
    AppConfig, AppContext, CancelHandle, Crew, RoleRunner, RunCoordinator, RunError, RunnerError,
    SchedulingStrategy, Services, ServicesFactory, TaskRequest,
};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Fail(String),
    /// Never completes; only a timeout or cancellation ends it.
    Hang,
}

/// Runner whose replies are scripted per task. Tasks without a script (or
/// with an exhausted one) get a deterministic default reply.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<(String, u32)>>,
    cancel_on: Mutex<Option<(String, CancelHandle)>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, task_id: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(task_id.to_string(), steps.into());
        self
    }

    /// Fires `handle` while `task_id` is running (the task itself still completes).
    pub fn cancel_during(self, task_id: &str, handle: CancelHandle) -> Self {
        *self.cancel_on.lock().unwrap() = Some((task_id.to_string(), handle));
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called_tasks(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for (task, _) in self.calls() {
            if !seen.contains(&task) {
                seen.push(task);
            }
        }
        seen
    }
}

/// JSON object filling every expected field, or plain text for narrative tasks.
pub fn default_reply(request: &TaskRequest) -> String {
    if !request.task.structured_output {
        return format!("{} done", request.task.id);
    }
    let mut object = Map::new();
    for field in &request.task.expected_fields {
        object.insert(field.clone(), Value::String(format!("{}:{field}", request.task.id)));
    }
    Value::Object(object).to_string()
}

#[async_trait]
impl RoleRunner for ScriptedRunner {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn run(&self, request: &TaskRequest) -> Result<String, RunnerError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.task.id.clone(), request.attempt));

        if let Some((task, handle)) = self.cancel_on.lock().unwrap().as_ref() {
            if task == &request.task.id {
                handle.cancel();
            }
        }

        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.task.id)
            .and_then(VecDeque::pop_front);

        match step {
            Some(Step::Reply(text)) => Ok(text),
            Some(Step::Fail(msg)) => Err(RunnerError::Other(msg)),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(default_reply(request)),
        }
    }
}

/// Hands out fixed services.
pub struct StaticFactory {
    pub runner: Arc<ScriptedRunner>,
    pub strategy: Option<Arc<dyn SchedulingStrategy>>,
}

#[async_trait]
impl ServicesFactory for StaticFactory {
    async fn build_services(&self, _cfg: &AppConfig) -> Result<Services, RunError> {
        let mut services = Services::new(self.runner.clone());
        services.scheduling_strategy = self.strategy.clone();
        Ok(services)
    }
}

pub fn coordinator(artifacts: &Path, factory: StaticFactory) -> RunCoordinator {
    let mut cfg = AppConfig::default();
    cfg.artifacts.directory = artifacts.display().to_string();
    RunCoordinator::new(AppContext::new(cfg, Some(Arc::new(factory))))
}

/// `P` (planner, structured), `L` (leader, narrative, needs P) and `F`
/// (frontend, structured, needs P and L).
pub fn plf_crew(retries: u32) -> Crew {
    let crew = r#"
name: plf
agents: [planner, team_leader, frontend_developer]
tasks: [P, L, F]
"#;
    let agents = format!(
        r#"
planner:
  role: Planner
  max_retry_limit: {retries}
team_leader:
  role: Team Leader
  max_retry_limit: {retries}
frontend_developer:
  role: Frontend Developer
  max_retry_limit: {retries}
"#
    );
    let tasks = r#"
P:
  agent: planner
  description: "Plan: {customer_request}"
  output_file: planner.json
  structured_output: true
  expected_fields: [features, pages]
  context:
    customer_request: "{customer_request}"
L:
  agent: team_leader
  output_file: blueprint.md
  context:
    planner_output: P.output
    website_name: "{website_name}"
F:
  agent: frontend_developer
  output_file: frontend.json
  structured_output: true
  expected_fields: [files, shared_classes]
  context:
    planner_output: P.output
    leader_blueprint: L.output
    ui_framework: gradio
"#;
    Crew::from_yaml_str(crew, &agents, tasks).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("sitecrew_core=debug")
        .try_init();
}
