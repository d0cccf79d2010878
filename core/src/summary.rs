//! The persisted record of one pipeline run.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::executor::{ExecutionReport, Parameters, TaskResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskErrorSummary {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub role: String,
    pub status: String,
    pub attempts: u32,
    pub retries: u32,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskErrorSummary>,
}

impl From<&TaskResult> for TaskSummary {
    fn from(result: &TaskResult) -> Self {
        Self {
            task_id: result.task_id.clone(),
            role: result.role.clone(),
            status: result.status.as_str().to_string(),
            attempts: result.attempts,
            retries: result.retries_used,
            duration_ms: result.duration_ms,
            artifact: result
                .artifact
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
            output: result.output.as_ref().map(|o| o.value.clone()),
            error: result.error.as_ref().map(|e| TaskErrorSummary {
                kind: e.kind().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ok: bool,
    pub run_id: String,
    pub request: String,
    pub name: String,
    pub artifacts_dir: String,
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub execution_order: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskSummary>,
    /// First task to fail, by execution order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<String>,
    #[serde(default)]
    pub pending: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    /// Fatal error that stopped the run before or during scheduling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
    /// Output of the last successful task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn from_report(
        report: &ExecutionReport,
        params: &Parameters,
        request: &str,
        name: &str,
        artifacts_dir: &str,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ok: report.succeeded(),
            run_id: report.run_id.clone(),
            request: request.to_string(),
            name: name.to_string(),
            artifacts_dir: artifacts_dir.to_string(),
            parameters: params.clone(),
            execution_order: report.execution_order.clone(),
            tasks: report.task_results.iter().map(TaskSummary::from).collect(),
            failed: report.first_failure.clone(),
            pending: report.pending.clone(),
            skipped: report.skipped.clone(),
            error: None,
            cancelled: report.cancelled,
            result: report.final_output().map(|o| o.value.clone()),
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Summary of a run that stopped on a fatal error.
    pub fn failure(
        run_id: &str,
        params: &Parameters,
        request: &str,
        name: &str,
        artifacts_dir: &str,
        error: impl ToString,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            ok: false,
            run_id: run_id.to_string(),
            request: request.to_string(),
            name: name.to_string(),
            artifacts_dir: artifacts_dir.to_string(),
            parameters: params.clone(),
            execution_order: Vec::new(),
            tasks: Vec::new(),
            failed: None,
            pending: Vec::new(),
            skipped: Vec::new(),
            error: Some(error.to_string()),
            cancelled: false,
            result: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskSummary> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_summary_serialises_error_and_omits_empty_fields() {
        let params = Parameters::from([("customer_request".to_string(), "x".to_string())]);
        let summary = RunSummary::failure(
            "run-1",
            &params,
            "x",
            "Generated Website",
            "artifacts",
            "Missing agent config for 'planner'. Check your YAML.",
            Utc::now(),
        );
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["ok"], json!(false));
        assert_eq!(
            value["error"],
            json!("Missing agent config for 'planner'. Check your YAML.")
        );
        assert!(value.get("failed").is_none());
        assert!(value.get("skipped").is_none());
        assert_eq!(value["pending"], json!([]));

        let back: RunSummary = serde_json::from_value(value).unwrap();
        assert_eq!(back, summary);
    }
}
