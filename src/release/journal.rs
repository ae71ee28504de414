//! Snapshots of files a release mutates
//!
//! The journal records the original content of each file before its first
//! write in a run. `restore` puts every recorded file back.

use crate::core::error::{ReleaseResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct FileJournal {
  entries: Vec<(PathBuf, Vec<u8>)>,
}

impl FileJournal {
  pub fn new() -> Self {
    Self::default()
  }

  /// Snapshot `path` unless it is already recorded
  pub fn record(&mut self, path: &Path) -> ReleaseResult<()> {
    if self.entries.iter().any(|(p, _)| p == path) {
      return Ok(());
    }
    let original = fs::read(path).with_context(|| format!("Failed to snapshot {}", path.display()))?;
    self.entries.push((path.to_path_buf(), original));
    Ok(())
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Recorded files, in the order they were first snapshotted
  pub fn paths(&self) -> impl Iterator<Item = &Path> {
    self.entries.iter().map(|(path, _)| path.as_path())
  }

  /// Write every snapshot back, newest first
  ///
  /// Attempts all files even if one fails; returns the first failure.
  pub fn restore(&self) -> ReleaseResult<()> {
    let mut first_err = None;
    for (path, original) in self.entries.iter().rev() {
      match fs::write(path, original).with_context(|| format!("Failed to restore {}", path.display())) {
        Ok(()) => tracing::info!(path = %path.display(), "restored"),
        Err(e) => {
          tracing::error!(path = %path.display(), error = %e, "restore failed");
          first_err.get_or_insert(e);
        }
      }
    }
    first_err.map_or(Ok(()), Err)
  }
}
