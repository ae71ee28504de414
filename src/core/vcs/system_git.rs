//! System git backend
//!
//! Every operation is one `git` subprocess with an isolated environment.

use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Author identity used for release commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub name: String,
  pub email: String,
}

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Directory commands run from; relative paths resolve against it
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open the repository containing `path`
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::Commit(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ReleaseError::message(format!("Failed to open git repository: {}", stderr)));
    }

    tracing::debug!(work_tree = %String::from_utf8_lossy(&output.stdout).trim(), "opened repository");
    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  /// Get current branch name
  pub fn current_branch(&self) -> ReleaseResult<String> {
    let output = self.run(&["rev-parse", "--abbrev-ref", "HEAD"], "git rev-parse --abbrev-ref HEAD")?;
    let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if branch == "HEAD" {
      return Err(ReleaseError::Commit(GitError::CommandFailed {
        command: "git rev-parse --abbrev-ref HEAD".to_string(),
        stderr: "HEAD is detached; check out the release branch first".to_string(),
      }));
    }
    Ok(branch)
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> ReleaseResult<String> {
    let output = self.run(&["rev-parse", "HEAD"], "git rev-parse HEAD")?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Stage the given paths (relative to the directory the repo was opened from)
  pub fn stage(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    let mut cmd = self.git_cmd();
    cmd.arg("add").arg("--");
    for path in paths {
      cmd.arg(path);
    }
    let output = cmd.output().context("Failed to run git add")?;
    check(output, "git add").map(|_| ())
  }

  /// Commit the index as `identity`
  pub fn commit(&self, message: &str, identity: &Identity) -> ReleaseResult<()> {
    let output = self
      .git_cmd()
      .arg("-c")
      .arg(format!("user.name={}", identity.name))
      .arg("-c")
      .arg(format!("user.email={}", identity.email))
      .args(["commit", "--no-verify", "-m", message])
      .output()
      .context("Failed to run git commit")?;
    check(output, "git commit").map(|_| ())
  }

  /// Push a branch to a remote
  pub fn push(&self, remote: &str, branch: &str) -> ReleaseResult<()> {
    let output = self
      .git_cmd()
      .args(["push", remote, branch])
      .output()
      .context("Failed to push")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ReleaseError::Commit(GitError::PushFailed {
        remote: remote.to_string(),
        branch: branch.to_string(),
        reason: stderr.trim_end().to_string(),
      }));
    }
    Ok(())
  }

  fn run(&self, args: &[&str], label: &str) -> ReleaseResult<Output> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to run {}", label))?;
    check(output, label)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to the repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (release credentials never reach git)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");
    cmd.arg("-c").arg("commit.gpgsign=false");

    cmd
  }
}

fn check(output: Output, command: &str) -> ReleaseResult<Output> {
  if !output.status.success() {
    return Err(ReleaseError::Commit(GitError::CommandFailed {
      command: command.to_string(),
      stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
    }));
  }
  Ok(output)
}
