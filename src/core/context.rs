//! Release context - resolve once, pass everywhere
//!
//! Built in main.rs from the current directory and handed to commands by
//! reference, so config lookup and identity resolution happen in one place.

use crate::core::config::ReleaseConfig;
use crate::core::error::{ConfigError, ReleaseResult};
use crate::core::vcs::Identity;
use std::env;
use std::path::{Path, PathBuf};

/// Environment overrides for the release commit author
pub const AUTHOR_NAME_ENV: &str = "RELEASE_AUTHOR_NAME";
pub const AUTHOR_EMAIL_ENV: &str = "RELEASE_AUTHOR_EMAIL";

pub struct ReleaseContext {
  /// Package root: the directory holding release.toml
  pub root: PathBuf,

  /// Where the config was found
  pub config_path: PathBuf,

  pub config: ReleaseConfig,
}

impl ReleaseContext {
  /// Locate and load release.toml under `root`
  pub fn build(root: &Path) -> ReleaseResult<Self> {
    let config_path = ReleaseConfig::find_config_path(root).ok_or_else(|| ConfigError::NotFound {
      root: root.to_path_buf(),
    })?;
    let config = ReleaseConfig::load(root)?;
    tracing::debug!(path = %config_path.display(), package = %config.package.name, "config loaded");

    Ok(Self {
      root: root.to_path_buf(),
      config_path,
      config,
    })
  }

  /// Commit author: environment first, then `[git]` config
  pub fn identity(&self) -> Identity {
    resolve_identity(
      env::var(AUTHOR_NAME_ENV).ok(),
      env::var(AUTHOR_EMAIL_ENV).ok(),
      &self.config,
    )
  }
}

fn resolve_identity(name: Option<String>, email: Option<String>, config: &ReleaseConfig) -> Identity {
  let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
  Identity {
    name: non_empty(name).unwrap_or_else(|| config.git.author_name.clone()),
    email: non_empty(email).unwrap_or_else(|| config.git.author_email.clone()),
  }
}
