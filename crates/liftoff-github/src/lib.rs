//! Liftoff GitHub - GitHub integration for release automation
//!
//! Implements the [`Provider`](liftoff_core::provider::Provider) interface on
//! top of the GitHub REST API: pull requests, users, labels, releases,
//! commit statuses and comments.

mod client;
mod models;
mod remote;

pub use client::GithubClient;
pub use remote::parse_remote;
