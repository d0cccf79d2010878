use crate::executor::types::{ExecutionReport, TaskResult};

/// 输出渲染器插件（控制输出格式）
pub trait OutputRendererPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn format(&self) -> &str;
    fn render(&self, event: &RenderEvent);
}

/// 渲染事件（统一事件类型）
#[derive(Debug, Clone)]
pub enum RenderEvent {
    RunStart {
        run_id: String,
        total_tasks: usize,
    },
    Plan {
        run_id: String,
        order: Vec<String>,
    },
    TaskStart {
        run_id: String,
        task_id: String,
        role: String,
        attempt: u32,
    },
    TaskRetry {
        run_id: String,
        task_id: String,
        attempt: u32,
        error: String,
        delay_ms: u64,
    },
    TaskComplete {
        run_id: String,
        result: TaskResult,
    },
    TaskSkipped {
        run_id: String,
        task_id: String,
    },
    RunEnd {
        run_id: String,
        report: ExecutionReport,
    },
}
