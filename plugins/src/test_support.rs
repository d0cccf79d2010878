use std::time::Duration;

use sitecrew_core::api::{Role, TaskRequest, TaskSpec};

pub(crate) fn request(task_id: &str, role_id: &str) -> TaskRequest {
    TaskRequest {
        run_id: "run-test".into(),
        task: TaskSpec::new(task_id, role_id).with_description(format!("Do {task_id}")),
        role: Role::new(role_id),
        inputs: Vec::new(),
        prompt: format!("You are {role_id}.\n\n## Task\nDo {task_id}\n"),
        attempt: 0,
        timeout: Duration::from_secs(5),
    }
}
