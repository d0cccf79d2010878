use std::path::PathBuf;

use crate::executor::types::TaskOutput;
use crate::task::TaskSpec;

/// Destination for successful task outputs.
pub trait ArtifactSink: Send + Sync {
    /// Persists `output` under the task's sink name and returns where it went.
    fn persist(&self, task: &TaskSpec, output: &TaskOutput) -> std::io::Result<PathBuf>;
}
