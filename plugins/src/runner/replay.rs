use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use sitecrew_core::api::{RoleRunner, RunnerError, TaskRequest};

const EXTENSIONS: [&str; 3] = ["json", "md", "txt"];

/// Serves recorded task outputs from a directory.
///
/// For attempt `n` of task `t` the first existing file among `t.n.json`,
/// `t.n.md`, `t.n.txt`, `t.json`, `t.md`, `t.txt` is returned verbatim.
pub struct ReplayRunnerPlugin {
    directory: PathBuf,
}

impl ReplayRunnerPlugin {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn candidates(&self, task_id: &str, attempt: u32) -> Vec<PathBuf> {
        let per_attempt = EXTENSIONS
            .iter()
            .map(|ext| format!("{task_id}.{attempt}.{ext}"));
        let shared = EXTENSIONS.iter().map(|ext| format!("{task_id}.{ext}"));
        per_attempt
            .chain(shared)
            .map(|name| self.directory.join(name))
            .collect()
    }
}

#[async_trait]
impl RoleRunner for ReplayRunnerPlugin {
    fn name(&self) -> &str {
        "replay"
    }

    async fn run(&self, request: &TaskRequest) -> Result<String, RunnerError> {
        for path in self.candidates(&request.task.id, request.attempt) {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    debug!(path = %path.display(), "Replaying recorded output");
                    return Ok(content);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(RunnerError::MissingRecording(request.task.id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::request;

    #[tokio::test]
    async fn per_attempt_recording_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("planner_task.json"), r#"{"features":[]}"#).unwrap();
        std::fs::write(dir.path().join("planner_task.1.md"), "second try").unwrap();
        let runner = ReplayRunnerPlugin::new(dir.path());

        let mut req = request("planner_task", "planner");
        assert_eq!(runner.run(&req).await.unwrap(), r#"{"features":[]}"#);
        req.attempt = 1;
        assert_eq!(runner.run(&req).await.unwrap(), "second try");
    }

    #[tokio::test]
    async fn missing_recording_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ReplayRunnerPlugin::new(dir.path());
        let err = runner
            .run(&request("testing_task", "tester"))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::MissingRecording(id) if id == "testing_task"));
    }
}
