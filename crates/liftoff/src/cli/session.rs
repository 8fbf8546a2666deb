//! Loading a project for a command

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use liftoff_core::config::{load_config_or_default, Config};
use liftoff_core::error::PreconditionError;
use liftoff_git::GitVcs;
use liftoff_github::{parse_remote, GithubClient};
use liftoff_release::Liftoff;

use crate::cli::{output, Cli, OutputFormat};

/// Run a command future on a single-threaded runtime
pub fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Owner and repository from the configuration, falling back to the remote
fn repository(config: &Config, vcs: &GitVcs) -> anyhow::Result<(String, String)> {
    if let (Some(owner), Some(repo)) = (&config.owner, &config.repo) {
        return Ok((owner.clone(), repo.clone()));
    }

    let remote = &config.git.remote;
    let url = vcs
        .remote_url(remote)?
        .ok_or_else(|| PreconditionError::UnknownRepository(format!("no remote '{}'", remote)))?;
    let (owner, repo) = parse_remote(&url)
        .ok_or_else(|| PreconditionError::UnknownRepository(format!("unrecognized remote {}", url)))?;
    debug!(%owner, %repo, %url, "repository detected from remote");

    Ok((
        config.owner.clone().unwrap_or(owner),
        config.repo.clone().unwrap_or(repo),
    ))
}

/// Discover the configuration and repository and load a [`Liftoff`]
pub async fn load(cli: &Cli) -> anyhow::Result<Liftoff> {
    let cwd = std::env::current_dir()?;
    let (config, config_path) = load_config_or_default(&cwd)?;

    if config_path.is_none() && !cli.quiet && cli.format == OutputFormat::Text {
        output::warning("No configuration found, using defaults.");
    }

    let vcs = GitVcs::discover(&cwd)?;
    let (owner, repo) = repository(&config, &vcs)?;
    let provider = GithubClient::from_env(config.github.api_url.clone(), owner, repo)?;
    info!(
        config = ?config_path,
        owner = provider.owner(),
        repo = provider.repo(),
        "loading project"
    );

    let mut liftoff = Liftoff::new().with_root(vcs.workdir());
    liftoff.load(config, Arc::new(vcs), Arc::new(provider)).await?;
    Ok(liftoff)
}
