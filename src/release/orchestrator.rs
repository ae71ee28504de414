//! End-to-end release sequence
//!
//! ```text
//! Idle → Validated → VersionBumped → PrimaryPublished? → IntegrityVerified?
//!      → SecondaryPublished? → Committed? → Done
//! ```
//!
//! Optional stages are skipped, not entered, when their flag is off. Any
//! failure moves straight to `Aborted`. Before anything is mutated the run
//! checks credentials, the git branch, the recipe placeholder and (for a secondary-only
//! release) that the primary archive is already published.
//!
//! File writes are journaled. If a run aborts before any registry accepted an
//! upload, the version file and recipe are restored; once something is
//! published the working tree is left matching it.

use crate::core::config::ReleaseConfig;
use crate::core::error::{Registry, ReleaseError, ReleaseResult};
use crate::release::commit::{CommitRecord, ReleaseCommitter};
use crate::release::integrity::{ArtifactFetcher, ArtifactReference, IntegrityVerifier};
use crate::release::journal::FileJournal;
use crate::release::publish::{PublishOutcome, RegistryPublisher};
use crate::release::recipe::RecipePatcher;
use crate::release::request::ReleaseRequest;
use crate::release::version::SemanticVersion;
use crate::release::version_file::VersionStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseStage {
  Idle,
  Validated,
  VersionBumped,
  PrimaryPublished,
  IntegrityVerified,
  SecondaryPublished,
  Committed,
  Done,
  Aborted,
}

impl ReleaseStage {
  pub fn is_terminal(self) -> bool {
    matches!(self, ReleaseStage::Done | ReleaseStage::Aborted)
  }

  /// Legal transitions, including skips over disabled stages
  pub fn can_advance_to(self, next: ReleaseStage) -> bool {
    use ReleaseStage::*;
    match (self, next) {
      (Done | Aborted, _) => false,
      (_, Aborted) => true,
      (Idle, Validated) => true,
      (Validated, VersionBumped) => true,
      (VersionBumped, PrimaryPublished | IntegrityVerified | Committed | Done) => true,
      (PrimaryPublished, IntegrityVerified | Committed | Done) => true,
      (IntegrityVerified, SecondaryPublished) => true,
      (SecondaryPublished, Committed | Done) => true,
      (Committed, Done) => true,
      _ => false,
    }
  }
}

/// Stages a request will pass through, in order
pub fn planned_stages(request: &ReleaseRequest) -> Vec<ReleaseStage> {
  let mut stages = vec![ReleaseStage::Validated, ReleaseStage::VersionBumped];
  if request.publish_primary {
    stages.push(ReleaseStage::PrimaryPublished);
  }
  if request.publish_secondary {
    stages.push(ReleaseStage::IntegrityVerified);
    stages.push(ReleaseStage::SecondaryPublished);
  }
  if request.commits() {
    stages.push(ReleaseStage::Committed);
  }
  stages.push(ReleaseStage::Done);
  stages
}

/// Dry-run preview of a release
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  pub package: String,
  pub request: ReleaseRequest,
  pub current_version: SemanticVersion,
  pub proposed_version: SemanticVersion,
  pub stages: Vec<ReleaseStage>,
  /// Archive the integrity check will fetch, when the secondary registry is enabled
  pub artifact_locator: Option<String>,
}

impl ReleasePlan {
  pub fn build(config: &ReleaseConfig, request: ReleaseRequest, current_version: SemanticVersion) -> Self {
    let proposed_version = current_version.bump(request.target);
    Self {
      package: config.package.name.clone(),
      request,
      current_version,
      proposed_version,
      stages: planned_stages(&request),
      artifact_locator: request
        .publish_secondary
        .then(|| config.artifact_locator(proposed_version)),
    }
  }
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
  pub package: String,
  pub previous_version: SemanticVersion,
  pub version: SemanticVersion,
  pub outcomes: [PublishOutcome; 2],
  pub artifact: Option<ArtifactReference>,
  pub commit: Option<CommitRecord>,
  pub stages: Vec<ReleaseStage>,
  pub finished_at: DateTime<Utc>,
}

/// Raw trigger inputs, as supplied by the operator
#[derive(Debug, Clone)]
pub struct Trigger {
  pub target: String,
  pub primary: String,
  pub secondary: String,
}

/// External systems a release talks to
pub struct Collaborators<'a> {
  pub primary: &'a dyn RegistryPublisher,
  pub secondary: &'a dyn RegistryPublisher,
  pub fetcher: &'a dyn ArtifactFetcher,
  pub committer: &'a dyn ReleaseCommitter,
}

pub struct ReleaseOrchestrator<'a> {
  config: &'a ReleaseConfig,
  root: PathBuf,
  with: Collaborators<'a>,
  echo: bool,
  stage: ReleaseStage,
  trace: Vec<ReleaseStage>,
  journal: FileJournal,
  outcomes: [PublishOutcome; 2],
}

impl<'a> ReleaseOrchestrator<'a> {
  pub fn new(config: &'a ReleaseConfig, root: &Path, with: Collaborators<'a>) -> Self {
    Self {
      config,
      root: root.to_path_buf(),
      with,
      echo: true,
      stage: ReleaseStage::Idle,
      trace: vec![ReleaseStage::Idle],
      journal: FileJournal::new(),
      outcomes: [
        PublishOutcome::skipped(Registry::Primary),
        PublishOutcome::skipped(Registry::Secondary),
      ],
    }
  }

  /// Print step progress to stdout (on by default)
  pub fn echo(mut self, echo: bool) -> Self {
    self.echo = echo;
    self
  }

  /// States visited so far, starting at `Idle`
  pub fn trace(&self) -> &[ReleaseStage] {
    &self.trace
  }

  /// Execute one release run
  ///
  /// An orchestrator runs once; a second call fails without side effects.
  pub fn run(&mut self, trigger: &Trigger) -> ReleaseResult<ReleaseReport> {
    if self.stage != ReleaseStage::Idle {
      return Err(ReleaseError::message(format!(
        "Release already ran (stage: {:?}); start a new run",
        self.stage
      )));
    }

    match self.execute(trigger) {
      Ok(report) => Ok(report),
      Err(err) => {
        self.abort(&err);
        Err(err)
      }
    }
  }

  fn execute(&mut self, trigger: &Trigger) -> ReleaseResult<ReleaseReport> {
    let request = ReleaseRequest::validate(&trigger.target, &trigger.primary, &trigger.secondary)?;
    self.advance(ReleaseStage::Validated)?;
    tracing::info!(bump = %request.target, primary = request.publish_primary, secondary = request.publish_secondary, "request validated");

    if request.publish_primary {
      self.with.primary.preflight()?;
    }
    if request.publish_secondary {
      self.with.secondary.preflight()?;
    }
    if request.commits() {
      self.with.committer.preflight()?;
    }

    let store = VersionStore::new(self.root.join(&self.config.package.version_file));
    let previous = store.read()?;
    let version = previous.bump(request.target);
    let patcher = RecipePatcher::new(
      self.root.join(&self.config.package.recipe_file),
      self.config.package.placeholder.clone(),
    );
    let locator = self.config.artifact_locator(version);

    if request.publish_secondary {
      patcher.check()?;
      if !request.publish_primary {
        self.require_published(&locator, version)?;
      }
    }

    if version != previous {
      self.journal.record(store.path())?;
      store.write(version)?;
    }
    self.advance(ReleaseStage::VersionBumped)?;
    self.say(format!("📦 {} {} → {}", self.config.package.name, previous, version));

    if request.publish_primary {
      self.say("🚀 Publishing to primary registry...");
      self.publish(Registry::Primary, version)?;
      self.advance(ReleaseStage::PrimaryPublished)?;
      self.say("   ✅ Primary registry accepted the upload");
    }

    let mut artifact = None;
    if request.publish_secondary {
      self.say(format!("🔍 Verifying {}", locator));
      self.journal.record(patcher.path())?;
      let verifier = IntegrityVerifier::new(self.with.fetcher, patcher);
      let verified = verifier.verify(ArtifactReference::new(version, locator))?;
      self.advance(ReleaseStage::IntegrityVerified)?;
      self.say(format!("   ✅ sha256 {}", verified.digest_hex().unwrap_or_default()));
      artifact = Some(verified);

      self.say("🚀 Publishing to secondary registry...");
      self.publish(Registry::Secondary, version)?;
      self.advance(ReleaseStage::SecondaryPublished)?;
      self.say("   ✅ Secondary registry accepted the upload");
    }

    let mut commit = None;
    if request.commits() {
      let record = CommitRecord::for_version(version);
      let paths: Vec<PathBuf> = self
        .journal
        .paths()
        .map(|path| path.strip_prefix(&self.root).unwrap_or(path).to_path_buf())
        .collect();
      self.say(format!("📝 Committing '{}'", record.message));
      self.with.committer.commit(&record, &paths)?;
      self.advance(ReleaseStage::Committed)?;
      commit = Some(record);
    }

    self.advance(ReleaseStage::Done)?;
    Ok(ReleaseReport {
      package: self.config.package.name.clone(),
      previous_version: previous,
      version,
      outcomes: self.outcomes,
      artifact,
      commit,
      stages: self.trace.clone(),
      finished_at: Utc::now(),
    })
  }

  /// Secondary-only runs rebuild from an archive a previous run must have published
  fn require_published(&self, locator: &str, version: SemanticVersion) -> ReleaseResult<()> {
    if self.with.fetcher.exists(locator)? {
      return Ok(());
    }
    Err(ReleaseError::Fetch {
      locator: locator.to_string(),
      reason: format!("{} {} is not published on the primary registry", self.config.package.name, version),
      help: Some(
        "The secondary registry builds from the primary archive. Publish to the primary registry first, \
         or enable --primary YES in this run."
          .to_string(),
      ),
    })
  }

  fn publish(&mut self, registry: Registry, version: SemanticVersion) -> ReleaseResult<()> {
    let (publisher, slot) = match registry {
      Registry::Primary => (self.with.primary, 0),
      Registry::Secondary => (self.with.secondary, 1),
    };
    tracing::debug!(registry = %publisher.registry(), %version, "publishing");
    self.outcomes[slot] = PublishOutcome::failed(registry);
    publisher.publish(version)?;
    self.outcomes[slot] = PublishOutcome::published(registry);
    Ok(())
  }

  fn advance(&mut self, next: ReleaseStage) -> ReleaseResult<()> {
    if !self.stage.can_advance_to(next) {
      return Err(ReleaseError::message(format!(
        "Illegal release transition {:?} → {:?}",
        self.stage, next
      )));
    }
    tracing::debug!(from = ?self.stage, to = ?next, "stage");
    self.stage = next;
    self.trace.push(next);
    Ok(())
  }

  fn abort(&mut self, err: &ReleaseError) {
    let failed_at = self.stage;
    if !self.stage.is_terminal() {
      self.stage = ReleaseStage::Aborted;
      self.trace.push(ReleaseStage::Aborted);
    }
    tracing::error!(stage = ?failed_at, outcomes = ?self.outcomes, error = %err, "release aborted");

    let published = self.outcomes.iter().any(|o| o.succeeded);
    if published {
      tracing::warn!("a registry accepted this release; files not restored");
      self.say("⚠️  A registry already accepted this release; working tree left as published");
    } else if !self.journal.is_empty() {
      match self.journal.restore() {
        Ok(()) => self.say("↩️  Restored version file and recipe"),
        Err(e) => tracing::error!(error = %e, "could not restore files; inspect the working tree"),
      }
    }
  }

  fn say(&self, line: impl AsRef<str>) {
    if self.echo {
      println!("{}", line.as_ref());
    }
  }
}
