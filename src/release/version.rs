//! Three-component semantic versions and the bump algorithm

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Requested magnitude of the version increment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Target {
  /// Breaking release: `(major+1, 0, 0)`
  Major,
  /// Feature release: `(major, minor+1, 0)`
  Minor,
  /// Maintenance release: `(major, minor, release+1)`
  Release,
  /// Keep the current version
  None,
}

impl Target {
  pub fn is_bump(self) -> bool {
    !matches!(self, Target::None)
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Target::Major => "MAJOR",
      Target::Minor => "MINOR",
      Target::Release => "RELEASE",
      Target::None => "NONE",
    };
    f.write_str(s)
  }
}

/// A `major.minor.release` version
///
/// Field order gives the derived `Ord` its major → minor → release ordering.
/// Serializes as the `"x.y.z"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
  pub major: u64,
  pub minor: u64,
  pub release: u64,
}

impl SemanticVersion {
  pub fn new(major: u64, minor: u64, release: u64) -> Self {
    Self { major, minor, release }
  }

  /// Apply a target, returning the next version
  ///
  /// Parsed versions keep every component below `u64::MAX`, so the increment
  /// cannot overflow.
  pub fn bump(&self, target: Target) -> Self {
    match target {
      Target::Major => Self::new(self.major + 1, 0, 0),
      Target::Minor => Self::new(self.major, self.minor + 1, 0),
      Target::Release => Self::new(self.major, self.minor, self.release + 1),
      Target::None => *self,
    }
  }
}

impl Serialize for SemanticVersion {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl fmt::Display for SemanticVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.release)
  }
}

/// Error returned when a string is not a plain `x.y.z` version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVersionError(pub String);

impl fmt::Display for ParseVersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "'{}' is not a major.minor.release version", self.0)
  }
}

impl std::error::Error for ParseVersionError {}

impl FromStr for SemanticVersion {
  type Err = ParseVersionError;

  /// Parse `x.y.z`; pre-release and build metadata are rejected, as is any
  /// component equal to `u64::MAX`
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let parsed = semver::Version::parse(s).map_err(|_| ParseVersionError(s.to_string()))?;
    if !parsed.pre.is_empty() || !parsed.build.is_empty() {
      return Err(ParseVersionError(s.to_string()));
    }
    if [parsed.major, parsed.minor, parsed.patch].contains(&u64::MAX) {
      return Err(ParseVersionError(s.to_string()));
    }
    Ok(Self::new(parsed.major, parsed.minor, parsed.patch))
  }
}
