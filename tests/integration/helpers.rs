//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const PACKAGE: &str = "PyDTMC";
pub const VERSION_FILE: &str = "pydtmc/__init__.py";
pub const RECIPE_FILE: &str = "conda/meta.yaml";

/// A package repository with a bare remote and local registry directories
///
/// Publishers are plain shell commands that copy build output into
/// `registry/primary` and `registry/secondary`; the primary registry is
/// served to the integrity check over `file://`.
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
  pub remote: PathBuf,
  pub registry: PathBuf,
}

impl TestWorkspace {
  /// Create a released-once package at `version`
  pub fn new(version: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("pkg");
    let remote = root.path().join("remote.git");
    let registry = root.path().join("registry");
    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(registry.join("primary"))?;
    std::fs::create_dir_all(registry.join("secondary"))?;

    git(root.path(), &["init", "--bare", "--initial-branch=main", "remote.git"])?;
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["remote", "add", "origin", &remote.to_string_lossy()])?;

    let ws = Self {
      _root: root,
      path,
      remote,
      registry,
    };

    ws.write_file(
      VERSION_FILE,
      &format!("\"\"\"Discrete-time Markov chains\"\"\"\n\n__title__ = '{}'\n__version__ = '{}'\n", PACKAGE, version),
    )?;
    ws.write_file(
      RECIPE_FILE,
      "package:\n  name: pydtmc\n\nsource:\n  sha256: {{ SHA256 }}\n",
    )?;
    ws.write_file(".gitignore", "dist/\nconda-bld/\n")?;
    ws.write_config(&ws.default_config())?;

    ws.commit("Initial package")?;
    git(&ws.path, &["push", "-u", "origin", "main"])?;

    Ok(ws)
  }

  /// release.toml with shell publishers targeting the local registry
  pub fn default_config(&self) -> String {
    let registry = self.registry.display();
    format!(
      r#"[package]
name = "{PACKAGE}"
version_file = "{VERSION_FILE}"
recipe_file = "{RECIPE_FILE}"

[primary]
artifact_base_url = "file://{registry}/primary"
build = ["sh", "-c", "mkdir -p dist && printf '%s sdist {{version}}' {{package}} > dist/{{package}}-{{version}}.tar.gz"]
upload = ["cp", "dist/{{package}}-{{version}}.tar.gz", "{registry}/primary/"]

[secondary]
build = ["sh", "-c", "mkdir -p conda-bld && cp {RECIPE_FILE} conda-bld/pydtmc-{{version}}.yaml"]
upload = ["cp", "conda-bld/*.yaml", "{registry}/secondary/"]

[git]
author_name = "release-bot"
author_email = "release-bot@example.com"
"#
    )
  }

  pub fn write_config(&self, content: &str) -> Result<()> {
    self.write_file("release.toml", content)
  }

  pub fn write_file(&self, rel: &str, content: &str) -> Result<()> {
    let file = self.path.join(rel);
    if let Some(parent) = file.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file, content)?;
    Ok(())
  }

  pub fn read_file(&self, rel: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(rel))?)
  }

  /// Commit all changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    self.head()
  }

  pub fn head(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// `<author> | <subject>` of the newest commit on the remote's main branch
  pub fn remote_head_summary(&self) -> Result<String> {
    let output = git(&self.remote, &["log", "-1", "--format=%an | %s", "main"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn commit_count(&self) -> Result<usize> {
    let output = git(&self.path, &["rev-list", "--count", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().parse()?)
  }

  /// Place an archive in the primary registry as if an earlier run uploaded it
  pub fn seed_primary_archive(&self, version: &str, content: &[u8]) -> Result<PathBuf> {
    let archive = self
      .registry
      .join("primary")
      .join(format!("{}-{}.tar.gz", PACKAGE, version));
    std::fs::write(&archive, content)?;
    Ok(archive)
  }

  pub fn registry_file(&self, registry: &str, name: &str) -> PathBuf {
    self.registry.join(registry).join(name)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run pkg-release, returning its output whatever the exit status
///
/// Trigger and identity variables from the outer environment are removed;
/// pass them through `envs` instead.
pub fn run_pkg_release(cwd: &Path, args: &[&str], envs: &[(&str, &str)]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_pkg-release");

  let mut cmd = Command::new(bin);
  cmd.current_dir(cwd).args(args);
  for var in [
    "RELEASE_TARGET",
    "RELEASE_PRIMARY",
    "RELEASE_SECONDARY",
    "RELEASE_AUTHOR_NAME",
    "RELEASE_AUTHOR_EMAIL",
    "RUST_LOG",
  ] {
    cmd.env_remove(var);
  }
  cmd.envs(envs.iter().copied());

  cmd.output().context("Failed to run pkg-release")
}

/// Run pkg-release and fail unless it exits successfully
pub fn run_pkg_release_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_pkg_release(cwd, args, &[])?;
  if !output.status.success() {
    anyhow::bail!(
      "pkg-release command failed: pkg-release {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }
  Ok(output)
}

/// Hex SHA-256 of a file, computed with the same crates the binary uses
pub fn sha256_file(path: &Path) -> Result<String> {
  use sha2::{Digest, Sha256};
  let bytes = std::fs::read(path)?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}
