use std::time::Duration;

use super::reference::InputSource;

/// One named input of a task and where its value comes from.
#[derive(Debug, Clone, PartialEq)]
pub struct InputBinding {
    pub name: String,
    pub source: InputSource,
}

/// Declarative definition of one pipeline step.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub id: String,
    /// Owning role id.
    pub role: String,
    pub description: String,
    pub expected_output: String,
    /// Artifact file name; defaults to `<id>.json` or `<id>.md`.
    pub output_sink: Option<String>,
    /// Ordered: inputs are resolved and presented in declaration order.
    pub inputs: Vec<InputBinding>,
    pub structured_output: bool,
    pub retry_on_validation_failure: bool,
    /// Top-level keys a structured output must carry.
    pub expected_fields: Vec<String>,
    /// Overrides of the owning role's limits.
    pub max_execution_time: Option<Duration>,
    pub max_retries: Option<u32>,
}

impl TaskSpec {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            description: String::new(),
            expected_output: String::new(),
            output_sink: None,
            inputs: Vec::new(),
            structured_output: false,
            retry_on_validation_failure: false,
            expected_fields: Vec::new(),
            max_execution_time: None,
            max_retries: None,
        }
    }

    pub fn input(mut self, name: impl Into<String>, source: InputSource) -> Self {
        self.inputs.push(InputBinding {
            name: name.into(),
            source,
        });
        self
    }

    /// Requires a JSON object result and retries on validation failure.
    pub fn structured(mut self) -> Self {
        self.structured_output = true;
        self.retry_on_validation_failure = true;
        self
    }

    pub fn with_expected_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sink(mut self, file_name: impl Into<String>) -> Self {
        self.output_sink = Some(file_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn sink_name(&self) -> String {
        match &self.output_sink {
            Some(name) => name.clone(),
            None if self.structured_output => format!("{}.json", self.id),
            None => format!("{}.md", self.id),
        }
    }

    /// Upstream task ids, deduplicated, in first-reference order.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for binding in &self.inputs {
            if let Some(upstream) = binding.source.upstream() {
                if !deps.contains(&upstream) {
                    deps.push(upstream);
                }
            }
        }
        deps
    }

    /// True when every input is an external parameter or a literal.
    pub fn is_root(&self) -> bool {
        self.inputs.iter().all(|b| b.source.upstream().is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sink_follows_output_kind() {
        assert_eq!(TaskSpec::new("planner_task", "planner").sink_name(), "planner_task.md");
        assert_eq!(
            TaskSpec::new("planner_task", "planner").structured().sink_name(),
            "planner_task.json"
        );
        assert_eq!(
            TaskSpec::new("team_leader_task", "team_leader")
                .with_sink("blueprint.md")
                .sink_name(),
            "blueprint.md"
        );
    }

    #[test]
    fn dependencies_are_deduplicated() {
        let spec = TaskSpec::new("testing_task", "tester")
            .input("features", InputSource::output_field("planner_task", "features"))
            .input("plan", InputSource::output("planner_task"))
            .input("launch_cmd", InputSource::parse("python app.py"))
            .input("final_dir", InputSource::output_field("repo_task", "final_directory"));
        assert_eq!(spec.dependencies(), vec!["planner_task", "repo_task"]);
        assert!(!spec.is_root());
    }
}
