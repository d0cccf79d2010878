//! Filesystem sink for task outputs and the run summary.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::executor::traits::ArtifactSink;
use crate::executor::TaskOutput;
use crate::summary::RunSummary;
use crate::task::TaskSpec;

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Resolves a sink name inside the artifacts directory. Absolute paths and
    /// `..` components are refused.
    pub fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if name.trim().is_empty() || escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact name '{name}' must be a relative path inside the artifacts directory"),
            ));
        }
        Ok(self.root.join(relative))
    }

    pub fn write(&self, name: &str, contents: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(name)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_summary(&self, file_name: &str, summary: &RunSummary) -> io::Result<PathBuf> {
        let json = serde_json::to_vec_pretty(summary)?;
        self.write(file_name, &json)
    }

    /// Regular files directly under the artifacts directory, sorted by name.
    pub fn list(&self) -> io::Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        Ok(files)
    }
}

impl ArtifactSink for ArtifactStore {
    fn persist(&self, task: &TaskSpec, output: &TaskOutput) -> io::Result<PathBuf> {
        let name = task.sink_name();
        if output.is_structured() {
            let json = serde_json::to_vec_pretty(&output.value)?;
            self.write(&name, &json)
        } else {
            self.write(&name, output.raw.as_bytes())
        }
    }
}
