//! Liftoff Git - Git operations for release automation
//!
//! This crate reads commit history (including pull request references in
//! merge and squash messages), manages release tags and pushes, and exposes
//! all of it to the release pipeline through [`GitVcs`].

mod commits;
pub mod message;
mod remote;
mod repository;
mod status;
mod tags;
pub mod types;
mod vcs;

pub use remote::git_push_with_tags;
pub use repository::{GitRepo, Result};
pub use types::TagInfo;
pub use vcs::GitVcs;
