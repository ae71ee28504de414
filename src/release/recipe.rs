//! Recipe placeholder patching
//!
//! The secondary registry's recipe carries a fixed placeholder token where the
//! primary artifact's digest belongs. Patching splits the file around the single
//! placeholder and rejoins it with the digest.

use crate::core::error::{ExtractionError, ReleaseError, ReleaseResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Default placeholder token
pub const DEFAULT_PLACEHOLDER: &str = "{{ SHA256 }}";

/// A recipe split around its single placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
  head: String,
  tail: String,
}

impl Recipe {
  /// Parse recipe content, requiring exactly one placeholder
  pub fn parse(path: &Path, content: &str, placeholder: &str) -> ReleaseResult<Self> {
    let occurrences = count(content, placeholder);
    if occurrences != 1 {
      return Err(
        ExtractionError::Placeholder {
          path: path.to_path_buf(),
          placeholder: placeholder.to_string(),
          occurrences,
        }
        .into(),
      );
    }

    // Exactly one occurrence, so find() is the one
    let start = content.find(placeholder).unwrap_or_default();
    Ok(Self {
      head: content[..start].to_string(),
      tail: content[start + placeholder.len()..].to_string(),
    })
  }

  /// Render with the digest in place of the placeholder
  pub fn render(&self, digest_hex: &str) -> String {
    format!("{}{}{}", self.head, digest_hex, self.tail)
  }
}

/// Patches a recipe file on disk and verifies the result
pub struct RecipePatcher {
  path: PathBuf,
  placeholder: String,
}

impl RecipePatcher {
  pub fn new(path: impl Into<PathBuf>, placeholder: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      placeholder: placeholder.into(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Fail unless the placeholder is present exactly once
  pub fn check(&self) -> ReleaseResult<()> {
    self.load().map(|_| ())
  }

  /// Replace the placeholder with `digest_hex`, then read back and verify
  pub fn patch(&self, digest_hex: &str) -> ReleaseResult<()> {
    let recipe = self.load()?;
    fs::write(&self.path, recipe.render(digest_hex))
      .with_context(|| format!("Failed to write {}", self.path.display()))?;
    tracing::debug!(path = %self.path.display(), "recipe patched");

    let reread =
      fs::read_to_string(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))?;
    let digests = count(&reread, digest_hex);
    let leftovers = count(&reread, &self.placeholder);
    if digests != 1 || leftovers != 0 {
      return Err(ReleaseError::Persistence {
        path: self.path.clone(),
        expected: "digest once and no placeholder".to_string(),
        found: format!("digest {} time(s), placeholder {} time(s)", digests, leftovers),
      });
    }
    Ok(())
  }

  fn load(&self) -> ReleaseResult<Recipe> {
    let content =
      fs::read_to_string(&self.path).with_context(|| format!("Failed to read {}", self.path.display()))?;
    Recipe::parse(&self.path, &content, &self.placeholder)
  }
}

fn count(haystack: &str, needle: &str) -> usize {
  if needle.is_empty() {
    return 0;
  }
  haystack.matches(needle).count()
}
