use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use sitecrew_core::api::{CommandRunnerConfig, RoleRunner, RunnerError, TaskRequest};

/// Bytes of stderr kept in an exit error.
const STDERR_TAIL: usize = 2048;

/// Runs an external agent CLI once per attempt.
///
/// The rendered prompt goes to stdin and stdout is the task output. The child
/// is killed when the attempt future is dropped (timeout or cancellation).
pub struct CommandRunnerPlugin {
    config: CommandRunnerConfig,
}

impl CommandRunnerPlugin {
    pub fn new(config: CommandRunnerConfig) -> Self {
        Self { config }
    }

    fn expand_arg(arg: &str, request: &TaskRequest) -> String {
        arg.replace("{role}", &request.role.id)
            .replace("{task}", &request.task.id)
    }
}

#[async_trait]
impl RoleRunner for CommandRunnerPlugin {
    fn name(&self) -> &str {
        "command"
    }

    async fn run(&self, request: &TaskRequest) -> Result<String, RunnerError> {
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|a| Self::expand_arg(a, request))
            .collect();
        debug!(program = %self.config.program, ?args, task_id = %request.task.id, "Spawning runner");

        let mut cmd = Command::new(&self.config.program);
        cmd.args(&args)
            .envs(&self.config.env)
            .env("SITECREW_RUN_ID", &request.run_id)
            .env("SITECREW_TASK_ID", &request.task.id)
            .env("SITECREW_ROLE_ID", &request.role.id)
            .env("SITECREW_ATTEMPT", request.attempt.to_string())
            .env("SITECREW_SEED", request.role.seed.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| RunnerError::Spawn(format!("{}: {e}", self.config.program)))?;

        let stdin = child.stdin.take();
        let prompt = request.prompt.as_bytes();
        let write = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(prompt).await?;
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output?;
        if let Err(e) = written {
            // The child may legitimately exit without reading its input.
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let trimmed = stderr.trim();
            let tail_start = trimmed
                .char_indices()
                .rev()
                .nth(STDERR_TAIL.saturating_sub(1))
                .map(|(i, _)| i)
                .unwrap_or(0);
            return Err(RunnerError::Exit {
                code: output.status.code().unwrap_or(-1),
                stderr: trimmed[tail_start..].to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
