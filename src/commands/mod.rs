//! CLI commands for pkg-release
//!
//! - **init**: scaffold `release.toml` for a package
//! - **release**: plan or apply a release run
//! - **digest**: print the SHA-256 of a published artifact
//!
//! Commands that need configuration take `&ReleaseContext`.

pub mod digest;
pub mod init;
pub mod release;

pub use digest::run_digest;
pub use init::run_init;
pub use release::{run_release_apply, run_release_plan};
