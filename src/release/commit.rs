//! Recording the release in source control

use crate::core::error::ReleaseResult;
use crate::core::vcs::{Identity, SystemGit};
use crate::release::version::SemanticVersion;
use serde::Serialize;
use std::path::PathBuf;

/// The single source-control mutation of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
  pub version: SemanticVersion,
  pub message: String,
}

impl CommitRecord {
  pub fn for_version(version: SemanticVersion) -> Self {
    Self {
      version,
      message: format!("Release {}", version),
    }
  }
}

/// Stages, commits and pushes release changes
pub trait ReleaseCommitter {
  /// Check a commit is possible before any file is touched
  fn preflight(&self) -> ReleaseResult<()> {
    Ok(())
  }

  fn commit(&self, record: &CommitRecord, paths: &[PathBuf]) -> ReleaseResult<()>;
}

/// Commits with system git as the release identity, then pushes the current branch
pub struct GitCommitter {
  root: PathBuf,
  remote: String,
  identity: Identity,
  push: bool,
}

impl GitCommitter {
  pub fn new(root: impl Into<PathBuf>, remote: impl Into<String>, identity: Identity, push: bool) -> Self {
    Self {
      root: root.into(),
      remote: remote.into(),
      identity,
      push,
    }
  }
}

impl ReleaseCommitter for GitCommitter {
  fn preflight(&self) -> ReleaseResult<()> {
    let git = SystemGit::open(&self.root)?;
    let branch = git.current_branch()?;
    tracing::debug!(%branch, remote = %self.remote, "commit preflight ok");
    Ok(())
  }

  fn commit(&self, record: &CommitRecord, paths: &[PathBuf]) -> ReleaseResult<()> {
    let git = SystemGit::open(&self.root)?;
    let branch = git.current_branch()?;
    git.stage(paths)?;
    git.commit(&record.message, &self.identity)?;
    let sha = git.head_commit()?;
    tracing::info!(%sha, message = %record.message, "release committed");

    if self.push {
      git.push(&self.remote, &branch)?;
      tracing::info!(remote = %self.remote, %branch, "release pushed");
    } else {
      tracing::warn!("push skipped; release commit exists locally only");
    }
    Ok(())
  }
}
