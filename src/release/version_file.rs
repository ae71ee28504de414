//! Version file parsing and writing
//!
//! The version lives in a Python-style module as a single
//! `__version__ = '<major>.<minor>.<release>'` line. The file is parsed into
//! head / version / tail segments so writing regenerates the content with every
//! unrelated byte preserved.

use crate::core::error::{ExtractionError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::version::SemanticVersion;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?m)^[ \t]*__version__[ \t]*=[ \t]*(?:'([0-9]+\.[0-9]+\.[0-9]+)'|"([0-9]+\.[0-9]+\.[0-9]+)")[ \t]*\r?$"#)
    .expect("version line regex is valid")
});

/// A version file split around its single version literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFile {
  head: String,
  version: SemanticVersion,
  tail: String,
}

impl VersionFile {
  /// Parse file content, requiring exactly one version assignment
  pub fn parse(path: &Path, content: &str) -> ReleaseResult<Self> {
    let matches: Vec<_> = VERSION_LINE.captures_iter(content).collect();
    if matches.len() != 1 {
      return Err(
        ExtractionError::VersionPattern {
          path: path.to_path_buf(),
          occurrences: matches.len(),
        }
        .into(),
      );
    }

    let literal = matches[0]
      .get(1)
      .or_else(|| matches[0].get(2))
      .ok_or_else(|| ReleaseError::message("version line matched without a version literal"))?;

    let version = literal
      .as_str()
      .parse::<SemanticVersion>()
      .map_err(|_| ExtractionError::MalformedVersion {
        path: path.to_path_buf(),
        literal: literal.as_str().to_string(),
      })?;

    Ok(Self {
      head: content[..literal.start()].to_string(),
      version,
      tail: content[literal.end()..].to_string(),
    })
  }

  pub fn version(&self) -> SemanticVersion {
    self.version
  }

  /// Same file with a different version literal
  pub fn with_version(&self, version: SemanticVersion) -> Self {
    Self {
      head: self.head.clone(),
      version,
      tail: self.tail.clone(),
    }
  }

  /// Regenerate the file content
  pub fn render(&self) -> String {
    format!("{}{}{}", self.head, self.version, self.tail)
  }
}

/// Reads and writes the version persisted in a source file
pub struct VersionStore {
  path: PathBuf,
}

impl VersionStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Read the current version
  pub fn read(&self) -> ReleaseResult<SemanticVersion> {
    Ok(self.load()?.version())
  }

  /// Replace the version, then read the file back to confirm the write
  pub fn write(&self, version: SemanticVersion) -> ReleaseResult<()> {
    let updated = self.load()?.with_version(version);
    fs::write(&self.path, updated.render()).with_context(|| format!("Failed to write {}", self.path.display()))?;
    tracing::debug!(path = %self.path.display(), %version, "version file written");

    let reread = self.read()?;
    if reread != version {
      return Err(ReleaseError::Persistence {
        path: self.path.clone(),
        expected: version.to_string(),
        found: reread.to_string(),
      });
    }
    Ok(())
  }

  fn load(&self) -> ReleaseResult<VersionFile> {
    let content =
      fs::read_to_string(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))?;
    VersionFile::parse(&self.path, &content)
  }
}
