use crate::core::error::ReleaseResult;
use crate::release::integrity::{ArtifactFetcher, RegistryFetcher, sha256_hex};
use serde::Serialize;

#[derive(Serialize)]
struct DigestOutput<'a> {
  locator: &'a str,
  bytes: usize,
  sha256: String,
}

/// Fetch an artifact and print its SHA-256
pub fn run_digest(locator: &str, json: bool) -> ReleaseResult<()> {
  let bytes = RegistryFetcher::new(!json).fetch(locator)?;
  let output = DigestOutput {
    locator,
    bytes: bytes.len(),
    sha256: sha256_hex(&bytes),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&output)?);
  } else {
    println!("{}  {}", output.sha256, output.locator);
  }
  Ok(())
}
