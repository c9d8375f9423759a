//! Filesystem helpers for stage outputs.

use std::path::Path;
use tokio::fs;

use crate::error::{MediaError, MediaResult};

/// Create the parent directory of `path` if it does not exist.
pub async fn ensure_parent_dir(path: impl AsRef<Path>) -> MediaResult<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Reject a stage that would write over its own input.
pub fn ensure_distinct(stage: &str, source: &Path, dest: &Path) -> MediaResult<()> {
    if source == dest {
        return Err(MediaError::invalid_request(format!(
            "{}: destination must differ from source ({})",
            stage,
            source.display()
        )));
    }
    Ok(())
}
