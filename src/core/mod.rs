//! Core building blocks shared by every command
//!
//! - **config**: `release.toml` parsing and validation
//! - **context**: repository root, config and commit identity, resolved once
//! - **error**: error types with exit codes and contextual help
//! - **vcs**: git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
