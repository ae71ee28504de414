//! Error types for pkg-release with contextual messages and exit codes
//!
//! Every failure aborts the release run. Nothing here is retried or downgraded
//! to a warning; the error is printed verbatim together with an optional help
//! line, and the process exits with the code of its category.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for pkg-release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad trigger input, config, missing files)
  User = 1,
  /// External system error (build, upload, fetch, git, I/O)
  System = 2,
  /// File content did not match its contract (pattern absent, verification mismatch)
  Integrity = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Which registry an error or outcome refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Registry {
  Primary,
  Secondary,
}

impl fmt::Display for Registry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Registry::Primary => f.pad("primary"),
      Registry::Secondary => f.pad("secondary"),
    }
  }
}

/// Main error type for pkg-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Trigger input rejected before anything ran
  Validation(ValidationError),

  /// Expected pattern not found (or found more than once) in a file
  Extraction(ExtractionError),

  /// A write could not be read back as written
  Persistence { path: PathBuf, expected: String, found: String },

  /// External build command failed
  Build { registry: Registry, reason: String },

  /// External upload command failed
  Upload { registry: Registry, reason: String },

  /// Artifact could not be retrieved for the integrity check
  Fetch { locator: String, reason: String, help: Option<String> },

  /// Staging, committing or pushing the release failed
  Commit(GitError),

  /// Configuration errors
  Config(ConfigError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Only `Message` carries free-form context. I/O errors become a `Message`;
  /// other typed variants already name what failed and are returned unchanged.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(e) => ReleaseError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Validation(_) => ExitCode::User,
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Message { .. } => ExitCode::User,
      ReleaseError::Extraction(_) => ExitCode::Integrity,
      ReleaseError::Persistence { .. } => ExitCode::Integrity,
      ReleaseError::Build { .. } => ExitCode::System,
      ReleaseError::Upload { .. } => ExitCode::System,
      ReleaseError::Fetch { .. } => ExitCode::System,
      ReleaseError::Commit(_) => ExitCode::System,
      ReleaseError::Io(_) => ExitCode::System,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Validation(e) => e.help_message(),
      ReleaseError::Extraction(e) => e.help_message(),
      ReleaseError::Persistence { .. } => {
        Some("The file was written but reads back differently. Inspect it before re-running.".to_string())
      }
      ReleaseError::Build { .. } | ReleaseError::Upload { .. } => Some(
        "Published artifacts are not withdrawn automatically. Check the registry before re-running.".to_string(),
      ),
      ReleaseError::Fetch { help, .. } => help.clone(),
      ReleaseError::Commit(e) => e.help_message(),
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Validation(e) => write!(f, "{}", e),
      ReleaseError::Extraction(e) => write!(f, "{}", e),
      ReleaseError::Persistence { path, expected, found } => write!(
        f,
        "Verification of {} failed: expected {}, found {}",
        path.display(),
        expected,
        found
      ),
      ReleaseError::Build { registry, reason } => write!(f, "Build for {} registry failed: {}", registry, reason),
      ReleaseError::Upload { registry, reason } => write!(f, "Upload to {} registry failed: {}", registry, reason),
      ReleaseError::Fetch { locator, reason, .. } => write!(f, "Failed to fetch {}: {}", locator, reason),
      ReleaseError::Commit(e) => write!(f, "{}", e),
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<ValidationError> for ReleaseError {
  fn from(err: ValidationError) -> Self {
    ReleaseError::Validation(err)
  }
}

impl From<ExtractionError> for ReleaseError {
  fn from(err: ExtractionError) -> Self {
    ReleaseError::Extraction(err)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for ReleaseError {
  fn from(err: toml_edit::ser::Error) -> Self {
    ReleaseError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<glob::PatternError> for ReleaseError {
  fn from(err: glob::PatternError) -> Self {
    ReleaseError::message(format!("Invalid glob pattern: {}", err))
  }
}

/// Trigger input errors (checked in order, first violation wins)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
  /// Target is not one of MAJOR, MINOR, RELEASE, NONE
  InvalidTarget { value: String },

  /// A publish flag is not YES or NO
  InvalidFlag { name: &'static str, value: String },

  /// Primary publish requested without a version bump
  PublishWithoutBump,

  /// Neither registry enabled
  NothingToDo,
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::InvalidTarget { .. } => Some("Use one of: MAJOR, MINOR, RELEASE, NONE".to_string()),
      ValidationError::InvalidFlag { .. } => Some("Use YES or NO".to_string()),
      ValidationError::PublishWithoutBump => Some(
        "The primary registry never accepts the same version twice. Choose MAJOR, MINOR or RELEASE.".to_string(),
      ),
      ValidationError::NothingToDo => Some("Enable --primary YES, --secondary YES, or both".to_string()),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::InvalidTarget { value } => write!(f, "invalid target: '{}'", value),
      ValidationError::InvalidFlag { name, value } => write!(f, "invalid flag: {} = '{}'", name, value),
      ValidationError::PublishWithoutBump => {
        write!(f, "invalid request: publishing to the primary registry requires a version bump")
      }
      ValidationError::NothingToDo => write!(f, "invalid request: no registry enabled, nothing to do"),
    }
  }
}

/// Pattern extraction errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
  /// `__version__ = 'x.y.z'` not present exactly once
  VersionPattern { path: PathBuf, occurrences: usize },

  /// The version line matched but its literal is not a usable version
  MalformedVersion { path: PathBuf, literal: String },

  /// Recipe placeholder not present exactly once
  Placeholder {
    path: PathBuf,
    placeholder: String,
    occurrences: usize,
  },
}

impl ExtractionError {
  fn help_message(&self) -> Option<String> {
    match self {
      ExtractionError::VersionPattern { occurrences: 0, .. } => {
        Some("Add a line like: __version__ = '0.1.0'".to_string())
      }
      ExtractionError::VersionPattern { .. } => Some("Keep exactly one __version__ assignment in the file".to_string()),
      ExtractionError::MalformedVersion { .. } => Some(
        "Use plain major.minor.release numbers without leading zeros, each below 18446744073709551615".to_string(),
      ),
      ExtractionError::Placeholder { occurrences: 0, .. } => Some(
        "The recipe was probably patched by a previous run. Restore the placeholder before releasing.".to_string(),
      ),
      ExtractionError::Placeholder { .. } => Some("Keep exactly one placeholder in the recipe".to_string()),
    }
  }
}

impl fmt::Display for ExtractionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ExtractionError::VersionPattern { path, occurrences } => write!(
        f,
        "Expected exactly one version assignment in {}, found {}",
        path.display(),
        occurrences
      ),
      ExtractionError::MalformedVersion { path, literal } => {
        write!(f, "Malformed version literal '{}' in {}", literal, path.display())
      }
      ExtractionError::Placeholder {
        path,
        placeholder,
        occurrences,
      } => write!(
        f,
        "Expected exactly one '{}' placeholder in {}, found {}",
        placeholder,
        path.display(),
        occurrences
      ),
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// release.toml not found
  NotFound { root: PathBuf },

  /// Missing or empty required field
  MissingField { field: String },

  /// Required environment variable not set
  MissingEnv { registry: Registry, name: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `pkg-release init --package <name>` to create one.".to_string()),
      ConfigError::MissingField { .. } => None,
      ConfigError::MissingEnv { name, .. } => Some(format!("Export {} in the release environment", name)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { root } => {
        write!(
          f,
          "No pkg-release configuration found.\nExpected file: {}/release.toml",
          root.display()
        )
      }
      ConfigError::MissingField { field } => write!(f, "Missing required field in config: {}", field),
      ConfigError::MissingEnv { registry, name } => {
        write!(f, "Environment variable {} required by the {} registry is not set", name, registry)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Push failed
  PushFailed {
    remote: String,
    branch: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") || reason.contains("rejected") {
          Some(
            "The remote moved during the release. The release commit exists locally only; rebase and push it by hand."
              .to_string(),
          )
        } else if reason.contains("Permission denied") || reason.contains("403") {
          Some("Check that the release identity has push access to the remote.".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run the release from inside a git checkout: {}",
        path.display()
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::PushFailed { remote, branch, reason } => {
        write!(f, "Push to {}/{} failed: {}", remote, branch, reason)
      }
    }
  }
}

/// Result type alias for pkg-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
