//! Trigger input validation
//!
//! Raw operator strings become a [`ReleaseRequest`] or a [`ValidationError`].
//! Rules are checked in order and the first violation wins:
//!
//! 1. target is MAJOR, MINOR, RELEASE or NONE (case-insensitive)
//! 2. each publish flag is YES or NO (case-insensitive)
//! 3. the primary registry is never published without a version bump
//! 4. at least one registry is enabled

use crate::core::error::ValidationError;
use crate::release::version::Target;
use serde::Serialize;

/// A validated release request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReleaseRequest {
  pub target: Target,
  pub publish_primary: bool,
  pub publish_secondary: bool,
}

impl ReleaseRequest {
  /// Validate raw trigger inputs
  pub fn validate(target: &str, primary: &str, secondary: &str) -> Result<Self, ValidationError> {
    let target = parse_target(target)?;
    let publish_primary = parse_flag("primary", primary)?;
    let publish_secondary = parse_flag("secondary", secondary)?;

    if publish_primary && !target.is_bump() {
      return Err(ValidationError::PublishWithoutBump);
    }
    if !publish_primary && !publish_secondary {
      return Err(ValidationError::NothingToDo);
    }

    Ok(Self {
      target,
      publish_primary,
      publish_secondary,
    })
  }

  /// Whether this run ends with a release commit
  pub fn commits(&self) -> bool {
    self.target.is_bump()
  }
}

fn parse_target(raw: &str) -> Result<Target, ValidationError> {
  match raw.to_ascii_uppercase().as_str() {
    "MAJOR" => Ok(Target::Major),
    "MINOR" => Ok(Target::Minor),
    "RELEASE" => Ok(Target::Release),
    "NONE" => Ok(Target::None),
    _ => Err(ValidationError::InvalidTarget { value: raw.to_string() }),
  }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ValidationError> {
  if raw.eq_ignore_ascii_case("YES") {
    Ok(true)
  } else if raw.eq_ignore_ascii_case("NO") {
    Ok(false)
  } else {
    Err(ValidationError::InvalidFlag {
      name,
      value: raw.to_string(),
    })
  }
}
