use crate::core::config::ReleaseConfig;
use crate::core::error::{ReleaseError, ReleaseResult};
use std::path::Path;

/// Scaffold release.toml in `root`
pub fn run_init(root: &Path, package: Option<String>) -> ReleaseResult<()> {
  if let Some(existing) = ReleaseConfig::find_config_path(root) {
    return Err(ReleaseError::with_help(
      format!("Configuration already exists at {}", existing.display()),
      "Edit the existing file or remove it before running 'pkg-release init'",
    ));
  }

  let package = match package {
    Some(name) => name,
    None => root
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .ok_or_else(|| ReleaseError::message("Cannot infer package name; pass --package"))?,
  };

  let config = ReleaseConfig::new(&package);
  config.save(root)?;

  println!("✅ Created release.toml for '{}'", package);
  println!();
  println!("  Version file: {}", config.package.version_file.display());
  println!("  Recipe file:  {}", config.package.recipe_file.display());
  println!("  Artifacts:    {}", config.primary.artifact_base_url);
  println!();
  println!("Review the build/upload commands, then try:");
  println!("  pkg-release plan --target MINOR --primary YES --secondary YES");
  Ok(())
}
