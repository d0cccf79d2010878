use chrono::Local;
use serde_json::{json, Value};
use sitecrew_core::api::{OutputRendererPlugin, RenderEvent, TaskResult};

/// Versioned JSON event per line on stderr, for machine consumers.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn result_json(result: &TaskResult) -> Value {
        json!({
            "role": result.role,
            "status": result.status.as_str(),
            "attempts": result.attempts,
            "retries_used": result.retries_used,
            "duration_ms": result.duration_ms,
            "artifact": result.artifact.as_ref().map(|p| p.display().to_string()),
            "error": result.error.as_ref().map(|e| json!({
                "kind": e.kind(),
                "message": e.to_string(),
            })),
        })
    }

    fn event_to_json(&self, event: &RenderEvent) -> Value {
        let ts = Local::now().to_rfc3339();
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
            } => json!({
                "v": 1,
                "event_type": "run.start",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "total_tasks": total_tasks,
                }
            }),
            RenderEvent::Plan { run_id, order } => json!({
                "v": 1,
                "event_type": "executor.plan",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "order": order,
                    "total_tasks": order.len(),
                }
            }),
            RenderEvent::TaskStart {
                run_id,
                task_id,
                role,
                attempt,
            } => json!({
                "v": 1,
                "event_type": "task.start",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "role": role,
                    "attempt": attempt,
                }
            }),
            RenderEvent::TaskRetry {
                run_id,
                task_id,
                attempt,
                error,
                delay_ms,
            } => json!({
                "v": 1,
                "event_type": "task.retry",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
                "metadata": {
                    "attempt": attempt,
                    "error": error,
                    "delay_ms": delay_ms,
                }
            }),
            RenderEvent::TaskComplete { run_id, result } => json!({
                "v": 1,
                "event_type": "task.end",
                "ts": ts,
                "run_id": run_id,
                "task_id": result.task_id,
                "metadata": Self::result_json(result),
            }),
            RenderEvent::TaskSkipped { run_id, task_id } => json!({
                "v": 1,
                "event_type": "task.skipped",
                "ts": ts,
                "run_id": run_id,
                "task_id": task_id,
            }),
            RenderEvent::RunEnd { run_id, report } => json!({
                "v": 1,
                "event_type": "run.end",
                "ts": ts,
                "run_id": run_id,
                "metadata": {
                    "ok": report.succeeded(),
                    "execution_order": report.execution_order,
                    "failed": report.first_failure,
                    "pending": report.pending,
                    "skipped": report.skipped,
                    "cancelled": report.cancelled,
                    "duration_ms": report.duration_ms,
                }
            }),
        }
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, event: &RenderEvent) {
        let value = self.event_to_json(event);
        let line = if self.pretty_print {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        if let Ok(line) = line {
            eprintln!("{}", line);
        }
    }
}
