//! Integration tests for `pkg-release digest`

use crate::helpers::{run_pkg_release, run_pkg_release_ok, sha256_file};
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_digest_of_local_artifact() -> Result<()> {
  let dir = TempDir::new()?;
  let archive = dir.path().join("PyDTMC-1.0.0.tar.gz");
  std::fs::write(&archive, b"sdist bytes")?;
  let locator = format!("file://{}", archive.display());

  let output = run_pkg_release_ok(dir.path(), &["digest", &locator, "--json"])?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(json["sha256"], sha256_file(&archive)?);
  assert_eq!(json["bytes"], 11);
  Ok(())
}

#[test]
fn test_digest_of_missing_artifact() -> Result<()> {
  let dir = TempDir::new()?;
  let locator = format!("file://{}/missing.tar.gz", dir.path().display());

  let output = run_pkg_release(dir.path(), &["digest", &locator], &[])?;
  assert_eq!(output.status.code(), Some(2));
  Ok(())
}
