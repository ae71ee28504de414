pub mod system_git;

pub use system_git::{Identity, SystemGit};
