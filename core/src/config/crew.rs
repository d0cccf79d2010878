//! Crew definition files: which roles exist, which tasks run, and how they
//! are wired together.
//!
//! Three YAML documents are involved:
//! - `crew.yaml` lists roles and tasks in order, the process and the manager.
//! - `agents.yaml` maps role id to [`RoleConfig`].
//! - `tasks.yaml` maps task id to [`TaskConfig`].

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::role::{ExecutionMode, Role, RoleRegistry};
use crate::task::{InputSource, TaskGraph, TaskSpec};

use super::types::CrewFilesConfig;

/// How the crew is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Strict declaration order.
    #[default]
    Sequential,
    /// A manager role may reorder or skip ready tasks.
    Hierarchical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewDefinition {
    #[serde(default = "default_crew_name")]
    pub name: String,
    #[serde(default)]
    pub process: Process,
    /// Coordinator role id; required for `hierarchical`.
    #[serde(default)]
    pub manager: Option<String>,
    /// External parameters tasks may reference as `{name}`.
    #[serde(default = "default_parameters")]
    pub parameters: Vec<String>,
    pub agents: Vec<String>,
    pub tasks: Vec<String>,
}

fn default_crew_name() -> String {
    "crew".to_string()
}

fn default_parameters() -> Vec<String> {
    vec![
        "customer_request".to_string(),
        "website_name".to_string(),
        "current_year".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Human title, e.g. "Senior Frontend Developer".
    pub role: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
    #[serde(default)]
    pub allow_code_execution: bool,
    #[serde(default)]
    pub code_execution_mode: ExecutionMode,
    #[serde(default)]
    pub allow_delegation: bool,
    /// Seconds.
    #[serde(default)]
    pub max_execution_time: Option<u64>,
    #[serde(default, alias = "max_retry_limit")]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub seed: Option<i64>,
}

impl RoleConfig {
    pub fn into_role(self, id: &str) -> Role {
        let mut role = Role::new(id);
        role.title = self.role;
        role.goal = self.goal;
        role.backstory = self.backstory;
        role.allow_code_execution = self.allow_code_execution;
        role.code_execution_mode = self.code_execution_mode;
        role.allow_delegation = self.allow_delegation;
        if let Some(secs) = self.max_execution_time {
            role.max_execution_time = Duration::from_secs(secs);
        }
        if let Some(retries) = self.max_retries {
            role.max_retries = retries;
        }
        if let Some(seed) = self.seed {
            role.seed = seed;
        }
        role.with_tags(self.tags)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expected_output: String,
    /// Owning role id.
    pub agent: String,
    /// File name under the artifacts directory.
    #[serde(default)]
    pub output_file: Option<String>,
    #[serde(default)]
    pub structured_output: bool,
    /// Defaults to `structured_output`.
    #[serde(default)]
    pub retry_on_validation_failure: Option<bool>,
    #[serde(default)]
    pub expected_fields: Vec<String>,
    #[serde(default)]
    pub max_execution_time: Option<u64>,
    #[serde(default, alias = "max_retry_limit")]
    pub max_retries: Option<u32>,
    /// Ordered input bindings. String values use the `{param}` /
    /// `<task>.output[.field]` shorthand; anything else is a literal.
    #[serde(default)]
    pub context: serde_yaml::Mapping,
}

impl TaskConfig {
    pub fn into_spec(self, id: &str) -> Result<TaskSpec, ConfigError> {
        let mut spec = TaskSpec::new(id, self.agent);
        spec.description = self.description;
        spec.expected_output = self.expected_output;
        spec.output_sink = self.output_file;
        spec.structured_output = self.structured_output;
        spec.retry_on_validation_failure = self
            .retry_on_validation_failure
            .unwrap_or(self.structured_output);
        spec.expected_fields = self.expected_fields;
        spec.max_execution_time = self.max_execution_time.map(Duration::from_secs);
        spec.max_retries = self.max_retries;

        for (key, value) in self.context {
            let Some(name) = key.as_str() else {
                return Err(ConfigError::InvalidInput {
                    task: id.to_string(),
                    input: format!("{key:?}"),
                    reason: "input names must be strings".into(),
                });
            };
            let source = match value {
                serde_yaml::Value::String(s) => InputSource::parse(&s),
                other => InputSource::Literal(serde_json::to_value(&other).map_err(|e| {
                    ConfigError::InvalidInput {
                        task: id.to_string(),
                        input: name.to_string(),
                        reason: e.to_string(),
                    }
                })?),
            };
            spec = spec.input(name, source);
        }

        Ok(spec)
    }
}

/// A fully validated crew: frozen registry plus acyclic task graph.
#[derive(Debug, Clone)]
pub struct Crew {
    pub definition: CrewDefinition,
    pub roles: RoleRegistry,
    pub graph: TaskGraph,
}

impl Crew {
    pub fn load(files: &CrewFilesConfig) -> Result<Self, ConfigError> {
        let crew_path = files.crew_path();
        let agents_path = files.agents_path();
        let tasks_path = files.tasks_path();

        let definition: CrewDefinition = read_yaml(&crew_path)?;
        let agents: BTreeMap<String, serde_yaml::Value> = read_yaml(&agents_path)?;
        let tasks: BTreeMap<String, serde_yaml::Value> = read_yaml(&tasks_path)?;

        Self::build(
            definition,
            &agents,
            &tasks,
            &agents_path.display().to_string(),
            &tasks_path.display().to_string(),
        )
    }

    /// Builds from in-memory YAML documents.
    pub fn from_yaml_str(crew: &str, agents: &str, tasks: &str) -> Result<Self, ConfigError> {
        let definition = parse_yaml(crew, "crew.yaml")?;
        let agents = parse_yaml(agents, "agents.yaml")?;
        let tasks = parse_yaml(tasks, "tasks.yaml")?;
        Self::build(definition, &agents, &tasks, "agents.yaml", "tasks.yaml")
    }

    fn build(
        definition: CrewDefinition,
        agents: &BTreeMap<String, serde_yaml::Value>,
        tasks: &BTreeMap<String, serde_yaml::Value>,
        agents_origin: &str,
        tasks_origin: &str,
    ) -> Result<Self, ConfigError> {
        let mut roles = RoleRegistry::new();
        for id in &definition.agents {
            let raw = agents
                .get(id)
                .filter(|v| v.is_mapping())
                .ok_or_else(|| ConfigError::MissingRole(id.clone()))?;
            let cfg: RoleConfig =
                serde_yaml::from_value(raw.clone()).map_err(|source| ConfigError::Yaml {
                    path: format!("{agents_origin} ({id})"),
                    source,
                })?;
            roles.register(cfg.into_role(id))?;
        }

        match (definition.process, definition.manager.as_deref()) {
            (Process::Hierarchical, Some(manager)) => roles.set_coordinator(manager)?,
            (Process::Hierarchical, None) => {
                return Err(ConfigError::Invalid(
                    "hierarchical process requires a manager role".into(),
                ))
            }
            (Process::Sequential, _) => {}
        }

        let mut graph = TaskGraph::new(definition.parameters.iter().cloned());
        for id in &definition.tasks {
            let raw = tasks
                .get(id)
                .filter(|v| v.is_mapping())
                .ok_or_else(|| ConfigError::MissingTask(id.clone()))?;
            let cfg: TaskConfig =
                serde_yaml::from_value(raw.clone()).map_err(|source| ConfigError::Yaml {
                    path: format!("{tasks_origin} ({id})"),
                    source,
                })?;
            let spec = cfg.into_spec(id)?;
            roles.get(&spec.role)?;
            graph.add_task(spec)?;
        }
        graph.validate()?;

        Ok(Self {
            definition,
            roles,
            graph,
        })
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_yaml(&s, &path.display().to_string())
}

fn parse_yaml<T: serde::de::DeserializeOwned>(s: &str, origin: &str) -> Result<T, ConfigError> {
    serde_yaml::from_str(s).map_err(|source| ConfigError::Yaml {
        path: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GraphError, RoleError};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const CREW: &str = r#"
name: mini
process: hierarchical
manager: team_leader
agents: [planner, team_leader, tester]
tasks: [planner_task, team_leader_task, testing_task]
"#;

    const AGENTS: &str = r#"
planner:
  role: Product Planner
  max_execution_time: 180
  max_retry_limit: 2
  tags: [planner, requirements]
team_leader:
  role: Team Leader
  allow_delegation: true
tester:
  role: QA Engineer
"#;

    const TASKS: &str = r#"
planner_task:
  agent: planner
  description: Plan {customer_request}
  output_file: planner.json
  structured_output: true
  expected_fields: [features]
  context:
    customer_request: "{customer_request}"
team_leader_task:
  agent: team_leader
  output_file: blueprint.md
  context:
    planner_output: planner_task.output
    website_name: "{website_name}"
testing_task:
  agent: tester
  structured_output: true
  max_retries: 1
  context:
    features: planner_task.output.features
    launch_cmd: python app.py
    port: 7860
"#;

    #[test]
    fn builds_registry_and_graph() {
        let crew = Crew::from_yaml_str(CREW, AGENTS, TASKS).unwrap();
        assert_eq!(crew.roles.len(), 3);
        assert_eq!(crew.roles.coordinator().unwrap().id, "team_leader");

        let planner = crew.roles.get("planner").unwrap();
        assert_eq!(planner.title, "Product Planner");
        assert_eq!(planner.max_execution_time, Duration::from_secs(180));
        assert_eq!(planner.seed, 7);

        let order: Vec<_> = crew.graph.topological_order().collect();
        assert_eq!(order, vec!["planner_task", "team_leader_task", "testing_task"]);

        let testing = crew.graph.get("testing_task").unwrap();
        assert!(testing.retry_on_validation_failure);
        assert_eq!(testing.max_retries, Some(1));
        let names: Vec<_> = testing.inputs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["features", "launch_cmd", "port"]);
        assert_eq!(testing.inputs[2].source, InputSource::Literal(json!(7860)));
    }

    #[test]
    fn missing_agent_entry_is_reported() {
        let agents = "planner:\n  role: Planner\ntester:\n  role: QA\n";
        let err = Crew::from_yaml_str(CREW, agents, TASKS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing agent config for 'team_leader'. Check your YAML."
        );
    }

    #[test]
    fn missing_task_entry_is_reported() {
        let tasks = "planner_task:\n  agent: planner\n";
        let err = Crew::from_yaml_str(CREW, AGENTS, tasks).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTask(id) if id == "team_leader_task"));
    }

    #[test]
    fn forward_reference_is_rejected() {
        let crew = CREW.replace(
            "[planner_task, team_leader_task, testing_task]",
            "[team_leader_task, planner_task, testing_task]",
        );
        let err = Crew::from_yaml_str(&crew, AGENTS, TASKS).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Graph(GraphError::DanglingReference { .. })
        ));
    }

    #[test]
    fn task_owner_must_be_registered() {
        let crew = CREW.replace("[planner, team_leader, tester]", "[planner, team_leader]");
        let err = Crew::from_yaml_str(&crew, AGENTS, TASKS).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Role(RoleError::Unknown(id)) if id == "tester"
        ));
    }

    #[test]
    fn hierarchical_needs_manager() {
        let crew = CREW.replace("manager: team_leader\n", "");
        assert!(matches!(
            Crew::from_yaml_str(&crew, AGENTS, TASKS),
            Err(ConfigError::Invalid(_))
        ));
    }
}
