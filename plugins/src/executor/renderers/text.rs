use sitecrew_core::api::{OutputRendererPlugin, RenderEvent, TaskStatus};

/// One human-readable line per event, on stderr.
pub struct TextRendererPlugin {
    ascii_only: bool,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    fn status_label(&self, status: TaskStatus) -> &'static str {
        match (status, self.ascii_only) {
            (TaskStatus::Succeeded, true) => "OK",
            (TaskStatus::Succeeded, false) => "SUCCESS",
            (TaskStatus::Failed, true) => "FAIL",
            (TaskStatus::Failed, false) => "FAILED",
            (other, _) => other.as_str(),
        }
    }

    fn format_event(&self, event: &RenderEvent) -> String {
        match event {
            RenderEvent::RunStart {
                run_id,
                total_tasks,
            } => format!("RUN START {} (tasks: {})", run_id, total_tasks),
            RenderEvent::Plan { run_id, order } => {
                let mut out = format!("PLAN {}:", run_id);
                for (idx, task_id) in order.iter().enumerate() {
                    out.push_str(&format!("\n  {}. {}", idx + 1, task_id));
                }
                out
            }
            RenderEvent::TaskStart {
                run_id,
                task_id,
                role,
                attempt,
            } => format!(
                "TASK START {} (task {}, role {}, attempt {})",
                run_id,
                task_id,
                role,
                attempt + 1
            ),
            RenderEvent::TaskRetry {
                run_id,
                task_id,
                attempt,
                error,
                delay_ms,
            } => format!(
                "TASK RETRY {} (task {}, attempt {} failed: {}; retrying in {}ms)",
                run_id,
                task_id,
                attempt + 1,
                error,
                delay_ms
            ),
            RenderEvent::TaskComplete { run_id, result } => {
                let mut line = format!(
                    "TASK END {} (task {}, status {}, duration {}ms, retries {})",
                    run_id,
                    result.task_id,
                    self.status_label(result.status),
                    result.duration_ms,
                    result.retries_used
                );
                if let Some(err) = &result.error {
                    line.push_str(&format!(": {}", err));
                }
                line
            }
            RenderEvent::TaskSkipped { run_id, task_id } => {
                format!("TASK SKIPPED {} (task {})", run_id, task_id)
            }
            RenderEvent::RunEnd { run_id, report } => {
                let completed = report
                    .task_results
                    .iter()
                    .filter(|r| r.succeeded())
                    .count();
                let failed = usize::from(report.first_failure.is_some());
                let mut line = format!(
                    "RUN END {} (completed {}, failed {}, pending {}, duration {}ms)",
                    run_id,
                    completed,
                    failed,
                    report.pending.len(),
                    report.duration_ms
                );
                if report.cancelled {
                    line.push_str(" [cancelled]");
                }
                line
            }
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, event: &RenderEvent) {
        eprintln!("{}", self.format_event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecrew_core::api::{TaskError, TaskResult};

    fn failed_result() -> TaskResult {
        TaskResult {
            task_id: "backend_developer_task".to_string(),
            role: "backend_developer".to_string(),
            status: TaskStatus::Failed,
            output: None,
            error: Some(TaskError::Timeout { ms: 1500 }),
            attempts: 3,
            retries_used: 2,
            duration_ms: 4500,
            artifact: None,
        }
    }

    #[test]
    fn task_complete_line_carries_status_and_error() {
        let renderer = TextRendererPlugin::new(true);
        let line = renderer.format_event(&RenderEvent::TaskComplete {
            run_id: "run".to_string(),
            result: failed_result(),
        });
        assert!(line.contains("TASK END"));
        assert!(line.contains("status FAIL"));
        assert!(line.contains("retries 2"));
        assert!(line.ends_with("execution timed out after 1500ms"));
    }

    #[test]
    fn plan_lists_tasks_in_order() {
        let renderer = TextRendererPlugin::new(false);
        let text = renderer.format_event(&RenderEvent::Plan {
            run_id: "run".to_string(),
            order: vec!["planner_task".into(), "team_leader_task".into()],
        });
        assert_eq!(text, "PLAN run:\n  1. planner_task\n  2. team_leader_task");
    }
}
