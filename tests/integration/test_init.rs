//! Integration tests for `pkg-release init`

use crate::helpers::{run_pkg_release, run_pkg_release_ok};
use anyhow::Result;
use tempfile::TempDir;

#[test]
fn test_init_creates_config() -> Result<()> {
  let dir = TempDir::new()?;

  let output = run_pkg_release_ok(dir.path(), &["init", "--package", "PyDTMC"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Created release.toml"));

  let config = std::fs::read_to_string(dir.path().join("release.toml"))?;
  let doc: toml_edit::DocumentMut = config.parse()?;
  assert_eq!(doc["package"]["name"].as_str(), Some("PyDTMC"));
  assert_eq!(doc["package"]["version_file"].as_str(), Some("pydtmc/__init__.py"));
  assert_eq!(
    doc["primary"]["artifact_base_url"].as_str(),
    Some("https://files.pythonhosted.org/packages/source/P/PyDTMC")
  );
  assert!(doc["secondary"]["upload"].as_array().is_some());
  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
  let dir = TempDir::new()?;
  std::fs::write(dir.path().join(".release.toml"), "# hand-written\n")?;

  let output = run_pkg_release(dir.path(), &["init", "--package", "PyDTMC"], &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(!dir.path().join("release.toml").exists());
  assert_eq!(
    std::fs::read_to_string(dir.path().join(".release.toml"))?,
    "# hand-written\n"
  );
  Ok(())
}
