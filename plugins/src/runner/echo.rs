use async_trait::async_trait;
use serde_json::{json, Map, Value};

use sitecrew_core::api::{RoleRunner, RunnerError, TaskRequest};

const PREVIEW_CHARS: usize = 80;

/// Dry-run runner. Describes the task and its resolved inputs as a JSON
/// object and fills every expected field with a placeholder, so structured
/// tasks validate and downstream field references resolve.
#[derive(Debug, Default)]
pub struct EchoRunnerPlugin;

impl EchoRunnerPlugin {
    pub fn new() -> Self {
        Self
    }
}

/// Short description of an input value; upstream outputs are summarised
/// rather than nested.
fn describe(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > PREVIEW_CHARS => {
            let head: String = s.chars().take(PREVIEW_CHARS).collect();
            Value::String(format!("{head}..."))
        }
        Value::Object(map) => json!({ "keys": map.keys().collect::<Vec<_>>() }),
        Value::Array(items) => json!({ "items": items.len() }),
        other => other.clone(),
    }
}

#[async_trait]
impl RoleRunner for EchoRunnerPlugin {
    fn name(&self) -> &str {
        "echo"
    }

    async fn run(&self, request: &TaskRequest) -> Result<String, RunnerError> {
        let inputs: Map<String, Value> = request
            .inputs
            .iter()
            .map(|i| (i.name.clone(), describe(&i.value)))
            .collect();

        let mut body = Map::new();
        body.insert("dry_run".into(), Value::Bool(true));
        body.insert("task".into(), Value::String(request.task.id.clone()));
        body.insert("role".into(), Value::String(request.role.title.clone()));
        body.insert("attempt".into(), json!(request.attempt));
        body.insert("inputs".into(), Value::Object(inputs));
        for field in &request.task.expected_fields {
            body.insert(
                field.clone(),
                Value::String(format!("<{field} from {}>", request.task.id)),
            );
        }

        serde_json::to_string_pretty(&Value::Object(body))
            .map_err(|e| RunnerError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::request;
    use sitecrew_core::api::{ResolvedInput, TaskSpec};

    #[tokio::test]
    async fn fills_expected_fields() {
        let mut req = request("planner_task", "planner");
        req.task = TaskSpec::new("planner_task", "planner")
            .structured()
            .with_expected_fields(["features", "pages"]);
        let out = EchoRunnerPlugin::new().run(&req).await.unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["task"], "planner_task");
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["features"], "<features from planner_task>");
        assert_eq!(value["pages"], "<pages from planner_task>");
    }

    #[tokio::test]
    async fn summarises_inputs() {
        let mut req = request("integration_task", "integrator");
        req.inputs = vec![
            ResolvedInput {
                name: "frontend".into(),
                value: json!({"files": ["index.html"], "shared_classes": []}),
            },
            ResolvedInput {
                name: "customer_request".into(),
                value: Value::String("x".repeat(200)),
            },
        ];
        let out = EchoRunnerPlugin::new().run(&req).await.unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["inputs"]["frontend"]["keys"], json!(["files", "shared_classes"]));
        let preview = value["inputs"]["customer_request"].as_str().unwrap();
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
    }
}
