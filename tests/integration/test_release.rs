//! Integration tests for `pkg-release plan` and `pkg-release apply`

use crate::helpers::{
  RECIPE_FILE, TestWorkspace, VERSION_FILE, git, run_pkg_release, run_pkg_release_ok, sha256_file,
};
use anyhow::Result;

const ORIGINAL_RECIPE: &str = "package:\n  name: pydtmc\n\nsource:\n  sha256: {{ SHA256 }}\n";

#[test]
fn test_minor_release_to_primary_only() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;

  let output = run_pkg_release_ok(
    &ws.path,
    &["apply", "--target", "MINOR", "--primary", "YES", "--secondary", "NO"],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("1.4.2 → 1.5.0"), "stdout: {}", stdout);

  assert!(ws.read_file(VERSION_FILE)?.contains("__version__ = '1.5.0'"));
  assert!(ws.registry_file("primary", "PyDTMC-1.5.0.tar.gz").is_file());
  assert_eq!(std::fs::read_dir(ws.registry.join("secondary"))?.count(), 0);
  assert_eq!(ws.read_file(RECIPE_FILE)?, ORIGINAL_RECIPE);
  assert_eq!(ws.remote_head_summary()?, "release-bot | Release 1.5.0");

  Ok(())
}

#[test]
fn test_primary_only_release_commits_only_the_version_file() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;
  std::fs::remove_file(ws.path.join(RECIPE_FILE))?;
  ws.commit("Drop conda recipe")?;

  run_pkg_release_ok(
    &ws.path,
    &["apply", "--target", "MINOR", "--primary", "YES", "--secondary", "NO"],
  )?;

  assert_eq!(ws.remote_head_summary()?, "release-bot | Release 1.5.0");
  let output = git(&ws.path, &["show", "--name-only", "--format=", "HEAD"])?;
  let changed = String::from_utf8_lossy(&output.stdout);
  assert_eq!(changed.trim(), VERSION_FILE);

  Ok(())
}

#[test]
fn test_full_release_pins_digest_before_secondary_build() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;

  run_pkg_release_ok(
    &ws.path,
    &["apply", "--target", "major", "--primary", "yes", "--secondary", "yes"],
  )?;

  let archive = ws.registry_file("primary", "PyDTMC-2.0.0.tar.gz");
  let digest = sha256_file(&archive)?;

  let recipe = ws.read_file(RECIPE_FILE)?;
  assert_eq!(recipe, format!("package:\n  name: pydtmc\n\nsource:\n  sha256: {}\n", digest));

  // The secondary build saw the patched recipe
  let uploaded = std::fs::read_to_string(ws.registry_file("secondary", "pydtmc-2.0.0.yaml"))?;
  assert!(uploaded.contains(&digest));
  assert!(!uploaded.contains("{{ SHA256 }}"));

  assert_eq!(ws.remote_head_summary()?, "release-bot | Release 2.0.0");
  Ok(())
}

#[test]
fn test_secondary_only_without_bump_does_not_commit() -> Result<()> {
  let ws = TestWorkspace::new("2.0.0")?;
  let archive = ws.seed_primary_archive("2.0.0", b"previously published sdist")?;
  let commits_before = ws.commit_count()?;

  run_pkg_release_ok(
    &ws.path,
    &["apply", "--target", "NONE", "--primary", "NO", "--secondary", "YES"],
  )?;

  assert!(ws.read_file(VERSION_FILE)?.contains("__version__ = '2.0.0'"));
  assert!(ws.read_file(RECIPE_FILE)?.contains(&sha256_file(&archive)?));
  assert!(ws.registry_file("secondary", "pydtmc-2.0.0.yaml").is_file());
  assert_eq!(ws.commit_count()?, commits_before);
  assert_eq!(ws.remote_head_summary()?, "Test User | Initial package");
  Ok(())
}

#[test]
fn test_secondary_only_with_unpublished_archive() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;

  let output = run_pkg_release(
    &ws.path,
    &["apply", "--target", "RELEASE", "--primary", "NO", "--secondary", "YES"],
    &[],
  )?;

  assert_eq!(output.status.code(), Some(2));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("PyDTMC-1.4.3.tar.gz"), "stderr: {}", stderr);
  assert!(stderr.contains("Help"), "stderr: {}", stderr);

  assert!(ws.read_file(VERSION_FILE)?.contains("'1.4.2'"));
  assert_eq!(ws.read_file(RECIPE_FILE)?, ORIGINAL_RECIPE);
  Ok(())
}

#[test]
fn test_rejected_trigger_exits_with_user_error() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;

  for args in [
    ["apply", "--target", "NONE", "--primary", "YES", "--secondary", "NO"],
    ["apply", "--target", "MINOR", "--primary", "NO", "--secondary", "NO"],
    ["apply", "--target", "PATCH", "--primary", "YES", "--secondary", "NO"],
    ["apply", "--target", "MINOR", "--primary", "Y", "--secondary", "NO"],
  ] {
    let output = run_pkg_release(&ws.path, &args, &[])?;
    assert_eq!(output.status.code(), Some(1), "args: {:?}", args);
  }

  assert!(ws.read_file(VERSION_FILE)?.contains("'1.4.2'"));
  assert_eq!(std::fs::read_dir(ws.registry.join("primary"))?.count(), 0);
  Ok(())
}

#[test]
fn test_missing_version_line_exits_with_integrity_error() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;
  ws.write_file(VERSION_FILE, "VERSION = '1.4.2'\n")?;

  let output = run_pkg_release(
    &ws.path,
    &["apply", "--target", "MINOR", "--primary", "YES", "--secondary", "YES"],
    &[],
  )?;

  assert_eq!(output.status.code(), Some(3));
  assert_eq!(std::fs::read_dir(ws.registry.join("primary"))?.count(), 0);
  assert_eq!(ws.read_file(RECIPE_FILE)?, ORIGINAL_RECIPE);
  Ok(())
}

#[test]
fn test_failed_primary_build_restores_version_file() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;
  let config = ws
    .default_config()
    .replacen("build = [\"sh\", \"-c\", \"mkdir -p dist", "build = [\"sh\", \"-c\", \"exit 1; mkdir -p dist", 1);
  ws.write_config(&config)?;
  let head = ws.head()?;

  let output = run_pkg_release(
    &ws.path,
    &["apply", "--target", "MINOR", "--primary", "YES", "--secondary", "NO"],
    &[],
  )?;

  assert_eq!(output.status.code(), Some(2));
  assert!(ws.read_file(VERSION_FILE)?.contains("__version__ = '1.4.2'"));
  assert_eq!(ws.head()?, head);
  Ok(())
}

#[test]
fn test_missing_credentials_checked_first() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;
  let config = ws.default_config().replacen(
    "[secondary]",
    "required_env = [\"PKG_RELEASE_TEST_UNSET_TOKEN\"]\n\n[secondary]",
    1,
  );
  ws.write_config(&config)?;

  let output = run_pkg_release(
    &ws.path,
    &["apply", "--target", "MINOR", "--primary", "YES", "--secondary", "NO"],
    &[],
  )?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("PKG_RELEASE_TEST_UNSET_TOKEN"), "stderr: {}", stderr);
  assert!(ws.read_file(VERSION_FILE)?.contains("'1.4.2'"));
  Ok(())
}

#[test]
fn test_no_push_keeps_commit_local() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;

  run_pkg_release_ok(
    &ws.path,
    &[
      "apply", "--target", "RELEASE", "--primary", "YES", "--secondary", "NO", "--no-push",
    ],
  )?;

  assert_eq!(ws.commit_count()?, 2);
  assert_eq!(ws.remote_head_summary()?, "Test User | Initial package");
  Ok(())
}

#[test]
fn test_author_from_environment() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;

  let output = run_pkg_release(
    &ws.path,
    &["apply", "--primary", "YES", "--secondary", "NO"],
    &[
      ("RELEASE_TARGET", "RELEASE"),
      ("RELEASE_AUTHOR_NAME", "ci-bot"),
      ("RELEASE_AUTHOR_EMAIL", "ci-bot@example.com"),
    ],
  )?;
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

  assert_eq!(ws.remote_head_summary()?, "ci-bot | Release 1.4.3");
  Ok(())
}

#[test]
fn test_apply_json_report() -> Result<()> {
  let ws = TestWorkspace::new("0.9.9")?;

  let output = run_pkg_release_ok(
    &ws.path,
    &[
      "apply", "--target", "MINOR", "--primary", "YES", "--secondary", "YES", "--json",
    ],
  )?;

  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["previous_version"], "0.9.9");
  assert_eq!(report["version"], "0.10.0");
  assert_eq!(report["outcomes"][0]["registry"], "primary");
  assert_eq!(report["outcomes"][0]["succeeded"], true);
  assert_eq!(report["outcomes"][1]["succeeded"], true);
  assert_eq!(report["commit"]["message"], "Release 0.10.0");
  assert_eq!(report["stages"].as_array().map(|s| s.len()), Some(8));
  assert!(report["artifact"]["locator"].as_str().unwrap().ends_with("PyDTMC-0.10.0.tar.gz"));
  Ok(())
}

#[test]
fn test_plan_reads_trigger_from_environment() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;

  let output = run_pkg_release(
    &ws.path,
    &["plan", "--json"],
    &[
      ("RELEASE_TARGET", "MAJOR"),
      ("RELEASE_PRIMARY", "YES"),
      ("RELEASE_SECONDARY", "NO"),
    ],
  )?;
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

  let plan: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(plan["current_version"], "1.4.2");
  assert_eq!(plan["proposed_version"], "2.0.0");
  assert_eq!(
    plan["stages"],
    serde_json::json!(["validated", "version_bumped", "primary_published", "committed", "done"])
  );
  assert!(plan["artifact_locator"].is_null());

  // Plan never touches the tree
  assert!(ws.read_file(VERSION_FILE)?.contains("'1.4.2'"));
  Ok(())
}

#[test]
fn test_apply_without_config() -> Result<()> {
  let ws = TestWorkspace::new("1.4.2")?;
  std::fs::remove_file(ws.path.join("release.toml"))?;

  let output = run_pkg_release(
    &ws.path,
    &["apply", "--target", "MINOR", "--primary", "YES", "--secondary", "NO"],
    &[],
  )?;
  assert_eq!(output.status.code(), Some(1));
  Ok(())
}
