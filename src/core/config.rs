use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::recipe::DEFAULT_PLACEHOLDER;
use crate::release::version::SemanticVersion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for pkg-release
/// Searched in order: release.toml, .release.toml, .config/release.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
  pub package: PackageConfig,
  pub primary: PrimaryConfig,
  pub secondary: SecondaryConfig,
  #[serde(default)]
  pub git: GitConfig,
}

/// The package being released and the two files a release mutates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Distribution name as it appears in artifact file names
  pub name: String,

  /// File holding `__version__ = 'x.y.z'` (relative to the config root)
  pub version_file: PathBuf,

  /// Secondary registry recipe holding the digest placeholder
  pub recipe_file: PathBuf,

  #[serde(default = "default_placeholder")]
  pub placeholder: String,
}

fn default_placeholder() -> String {
  DEFAULT_PLACEHOLDER.to_string()
}

/// Primary registry: builds the source archive every other target depends on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryConfig {
  /// Base URL the archive is served from after upload
  pub artifact_base_url: String,

  #[serde(flatten)]
  pub commands: PublishCommands,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryConfig {
  #[serde(flatten)]
  pub commands: PublishCommands,
}

/// Build and upload commands for one registry
///
/// Arguments may use `{version}` and `{package}`. Upload arguments containing
/// glob metacharacters are expanded after the build has run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishCommands {
  pub build: Vec<String>,
  pub upload: Vec<String>,

  /// Environment variables that must be present (values are never read or logged)
  #[serde(default)]
  pub required_env: Vec<String>,
}

/// Commit-back settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
  #[serde(default = "default_remote")]
  pub remote: String,

  /// Fallback identity when RELEASE_AUTHOR_NAME / RELEASE_AUTHOR_EMAIL are unset
  #[serde(default = "default_author_name")]
  pub author_name: String,

  #[serde(default = "default_author_email")]
  pub author_email: String,
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_author_name() -> String {
  "release-bot".to_string()
}

fn default_author_email() -> String {
  "release-bot@users.noreply.github.com".to_string()
}

impl Default for GitConfig {
  fn default() -> Self {
    Self {
      remote: default_remote(),
      author_name: default_author_name(),
      author_email: default_author_email(),
    }
  }
}

impl PublishCommands {
  fn validate(&self, section: &str) -> ReleaseResult<()> {
    if self.build.is_empty() {
      return Err(
        ConfigError::MissingField {
          field: format!("{}.build", section),
        }
        .into(),
      );
    }
    if self.upload.is_empty() {
      return Err(
        ConfigError::MissingField {
          field: format!("{}.upload", section),
        }
        .into(),
      );
    }
    Ok(())
  }
}

impl ReleaseConfig {
  /// Find config file in search order
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from release.toml (searches multiple locations)
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      ReleaseError::Config(ConfigError::NotFound {
        root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ReleaseConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Save config to release.toml (default location)
  pub fn save(&self, path: &Path) -> ReleaseResult<()> {
    let config_path = path.join("release.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  /// Starter config for a package, using PyPI + conda conventions
  pub fn new(package: &str) -> Self {
    let module = package.to_lowercase().replace('-', "_");
    let initial = package.chars().next().map(|c| c.to_string()).unwrap_or_default();
    Self {
      package: PackageConfig {
        name: package.to_string(),
        version_file: PathBuf::from(&module).join("__init__.py"),
        recipe_file: PathBuf::from("conda").join("meta.yaml"),
        placeholder: default_placeholder(),
      },
      primary: PrimaryConfig {
        artifact_base_url: format!("https://files.pythonhosted.org/packages/source/{}/{}", initial, package),
        commands: PublishCommands {
          build: vec!["python".into(), "-m".into(), "build".into(), "--sdist".into()],
          upload: vec!["twine".into(), "upload".into(), "dist/{package}-{version}.tar.gz".into()],
          required_env: vec!["TWINE_USERNAME".into(), "TWINE_PASSWORD".into()],
        },
      },
      secondary: SecondaryConfig {
        commands: PublishCommands {
          build: vec![
            "conda".into(),
            "build".into(),
            "conda".into(),
            "--output-folder".into(),
            "conda-bld".into(),
          ],
          upload: vec!["anaconda".into(), "upload".into(), "conda-bld/**/*.tar.bz2".into()],
          required_env: vec!["ANACONDA_API_TOKEN".into()],
        },
      },
      git: GitConfig::default(),
    }
  }

  /// Validate fields serde cannot
  pub fn validate(&self) -> ReleaseResult<()> {
    if self.package.name.trim().is_empty() {
      return Err(
        ConfigError::MissingField {
          field: "package.name".to_string(),
        }
        .into(),
      );
    }
    if self.package.placeholder.is_empty() {
      return Err(
        ConfigError::MissingField {
          field: "package.placeholder".to_string(),
        }
        .into(),
      );
    }
    if self.primary.artifact_base_url.trim().is_empty() {
      return Err(
        ConfigError::MissingField {
          field: "primary.artifact_base_url".to_string(),
        }
        .into(),
      );
    }
    self.primary.commands.validate("primary")?;
    self.secondary.commands.validate("secondary")?;
    Ok(())
  }

  /// Locator of the primary archive for a version
  ///
  /// `<artifact_base_url>/<Package>-<version>.tar.gz`
  pub fn artifact_locator(&self, version: SemanticVersion) -> String {
    format!(
      "{}/{}-{}.tar.gz",
      self.primary.artifact_base_url.trim_end_matches('/'),
      self.package.name,
      version
    )
  }
}
