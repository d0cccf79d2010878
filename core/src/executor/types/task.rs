use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::role::Role;
use crate::task::TaskSpec;

/// External run parameters (`customer_request`, `website_name`, ...).
pub type Parameters = BTreeMap<String, String>;

/// One input after resolution, in the task's declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedInput {
    pub name: String,
    pub value: Value,
}

/// Everything a runner needs for one attempt of one task.
#[derive(Debug, Clone)]
pub struct TaskRequest {
    pub run_id: String,
    pub task: TaskSpec,
    pub role: Role,
    pub inputs: Vec<ResolvedInput>,
    /// Fully rendered prompt text.
    pub prompt: String,
    /// 0 for the first attempt.
    pub attempt: u32,
    pub timeout: Duration,
}

impl TaskRequest {
    pub fn task_id(&self) -> &str {
        &self.task.id
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.iter().find(|i| i.name == name).map(|i| &i.value)
    }
}

/// Validated result of a task.
///
/// `raw` is what the runner produced; `value` is the parsed JSON object for
/// structured tasks and a JSON string holding `raw` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutput {
    pub raw: String,
    pub value: Value,
}

impl TaskOutput {
    pub fn text(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            value: Value::String(raw.clone()),
            raw,
        }
    }

    pub fn structured(raw: impl Into<String>, value: Value) -> Self {
        Self {
            raw: raw.into(),
            value,
        }
    }

    pub fn is_structured(&self) -> bool {
        self.value.is_object()
    }
}
