//! Stage chaining through a scoped workspace.

use std::path::{Path, PathBuf};

use crate::error::WorkerResult;
use crate::workspace::Workspace;

/// Owns the render workspace and a pointer to the latest intermediate.
///
/// Each stage reads [`current`](Self::current), writes to a fresh path from
/// [`next_output`](Self::next_output) and then [`advance`](Self::advance)s.
/// Dropping the pipeline deletes every intermediate.
#[derive(Debug)]
pub struct RenderPipeline {
    workspace: Workspace,
    current: PathBuf,
    step: usize,
}

impl RenderPipeline {
    pub async fn create(work_dir: &Path, label: &str) -> WorkerResult<Self> {
        let workspace = Workspace::create(work_dir, label).await?;
        let current = workspace.file("source.mp4");
        Ok(Self {
            workspace,
            current,
            step: 0,
        })
    }

    /// Where the downloaded source belongs. It is the first "current".
    pub fn source_path(&self) -> PathBuf {
        self.workspace.file("source.mp4")
    }

    pub fn current(&self) -> &Path {
        &self.current
    }

    /// Fresh numbered path for the output of `stage`.
    pub fn next_output(&mut self, stage: &str) -> PathBuf {
        self.step += 1;
        self.workspace
            .file(&format!("step{:02}_{}.mp4", self.step, stage))
    }

    /// Make `artifact` the input of the next stage.
    pub fn advance(&mut self, artifact: PathBuf) {
        self.current = artifact;
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.workspace.file(name)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn close(self) {
        self.workspace.close();
    }
}
