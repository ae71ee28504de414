//! Cross-registry integrity verification
//!
//! The secondary registry rebuilds from the archive the primary registry serves.
//! Its recipe pins that archive by SHA-256, so verification fetches the published
//! bytes, digests them, and writes the digest into the recipe.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::release::recipe::RecipePatcher;
use crate::release::version::SemanticVersion;
use crate::ui::progress::read_with_progress;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// A published artifact located for verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReference {
  pub version: SemanticVersion,
  pub locator: String,
  digest_hex: Option<String>,
}

impl ArtifactReference {
  pub fn new(version: SemanticVersion, locator: impl Into<String>) -> Self {
    Self {
      version,
      locator: locator.into(),
      digest_hex: None,
    }
  }

  /// Attach the computed digest; a reference carries at most one digest
  pub fn with_digest(self, digest_hex: String) -> Self {
    debug_assert!(self.digest_hex.is_none(), "digest is computed once");
    Self {
      digest_hex: Some(digest_hex),
      ..self
    }
  }

  pub fn digest_hex(&self) -> Option<&str> {
    self.digest_hex.as_deref()
  }
}

/// Lowercase hex SHA-256 of `bytes` (64 chars)
pub fn sha256_hex(bytes: &[u8]) -> String {
  hex::encode(Sha256::digest(bytes))
}

/// Retrieves published artifacts
pub trait ArtifactFetcher {
  /// Download the artifact bytes
  fn fetch(&self, locator: &str) -> ReleaseResult<Vec<u8>>;

  /// Whether the artifact is currently retrievable
  fn exists(&self, locator: &str) -> ReleaseResult<bool>;
}

/// Fetches `http(s)://` locators with ureq and `file://` locators from disk
pub struct RegistryFetcher {
  show_progress: bool,
}

impl RegistryFetcher {
  pub fn new(show_progress: bool) -> Self {
    Self { show_progress }
  }
}

impl ArtifactFetcher for RegistryFetcher {
  fn fetch(&self, locator: &str) -> ReleaseResult<Vec<u8>> {
    if let Some(path) = locator.strip_prefix("file://") {
      return fs::read(path).map_err(|e| fetch_error(locator, e.to_string()));
    }

    tracing::debug!(%locator, "fetching artifact");
    let response = ureq::get(locator).call().map_err(|e| fetch_error(locator, describe(e)))?;
    let total = response
      .header("Content-Length")
      .and_then(|len| len.parse::<usize>().ok())
      .filter(|_| self.show_progress);
    read_with_progress(response.into_reader(), total, "Downloading artifact")
      .map_err(|e| fetch_error(locator, e.to_string()))
  }

  fn exists(&self, locator: &str) -> ReleaseResult<bool> {
    if let Some(path) = locator.strip_prefix("file://") {
      return Ok(Path::new(path).is_file());
    }

    match ureq::head(locator).call() {
      Ok(_) => Ok(true),
      Err(ureq::Error::Status(code, _)) => {
        tracing::debug!(%locator, code, "artifact lookup returned non-success status");
        Ok(false)
      }
      Err(e) => Err(fetch_error(locator, describe(e))),
    }
  }
}

fn describe(err: ureq::Error) -> String {
  match err {
    ureq::Error::Status(code, response) => format!("HTTP {} {}", code, response.status_text()),
    ureq::Error::Transport(transport) => transport.to_string(),
  }
}

fn fetch_error(locator: &str, reason: String) -> ReleaseError {
  ReleaseError::Fetch {
    locator: locator.to_string(),
    reason,
    help: None,
  }
}

/// Fetches, digests and patches
pub struct IntegrityVerifier<'a> {
  fetcher: &'a dyn ArtifactFetcher,
  patcher: RecipePatcher,
}

impl<'a> IntegrityVerifier<'a> {
  pub fn new(fetcher: &'a dyn ArtifactFetcher, patcher: RecipePatcher) -> Self {
    Self { fetcher, patcher }
  }

  /// Verify `reference` and return it with its digest attached
  ///
  /// The recipe placeholder is checked before anything is downloaded.
  pub fn verify(&self, reference: ArtifactReference) -> ReleaseResult<ArtifactReference> {
    self.patcher.check()?;

    let bytes = self.fetcher.fetch(&reference.locator)?;
    let digest = sha256_hex(&bytes);
    tracing::info!(locator = %reference.locator, bytes = bytes.len(), %digest, "artifact digested");

    self.patcher.patch(&digest)?;
    Ok(reference.with_digest(digest))
  }
}
