//! Release pipeline
//!
//! A run bumps the version in the package's version file, publishes to the
//! primary registry, pins the published archive's SHA-256 into the secondary
//! registry's recipe, publishes there, then commits and pushes the result.
//!
//! # Layout
//!
//! - **request**: trigger validation (`Target`, registry flags)
//! - **version** / **version_file**: the version value and where it lives
//! - **publish**: registry publishers driven by configured commands
//! - **recipe** / **integrity**: digest fetch and recipe patching
//! - **commit**: the release commit and push
//! - **journal**: file snapshots for rollback
//! - **orchestrator**: the state machine tying it together

pub mod commit;
pub mod integrity;
pub mod journal;
pub mod orchestrator;
pub mod publish;
pub mod recipe;
pub mod request;
pub mod version;
pub mod version_file;

pub use commit::GitCommitter;
pub use integrity::RegistryFetcher;
pub use orchestrator::{Collaborators, ReleaseOrchestrator, ReleasePlan, ReleaseReport, ReleaseStage, Trigger};
pub use publish::CommandPublisher;
pub use request::ReleaseRequest;
pub use version_file::VersionStore;
