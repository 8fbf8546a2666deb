//! Shipit, next and canary commands

use clap::Args;
use tracing::info;

use liftoff_release::{CanaryOptions, ShipitOutcome};

use crate::cli::{output, session, Cli, OutputFormat};

/// Version, tag, changelog and publish in one step.
///
/// On the base branch this cuts a full release, on a prerelease branch a
/// prerelease, anywhere else a canary.
#[derive(Debug, Args)]
pub struct ShipitCommand {
    /// Dry run - don't make any changes
    #[arg(long)]
    pub dry_run: bool,
}

impl ShipitCommand {
    /// Execute the shipit command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, "executing shipit command");
        let liftoff = session::load(cli).await?;
        let outcome = liftoff.shipit(self.dry_run).await?;
        print_outcome(&outcome, self.dry_run, cli)
    }
}

fn print_outcome(outcome: &ShipitOutcome, dry_run: bool, cli: &Cli) -> anyhow::Result<()> {
    if cli.format == OutputFormat::Json {
        return output::json(outcome);
    }
    print_version(outcome.new_version.as_deref(), outcome.context.as_str(), dry_run, cli);
    if !cli.quiet {
        println!("{}", output::key_value("Commits", &outcome.commits.len().to_string()));
    }
    Ok(())
}

fn print_version(version: Option<&str>, kind: &str, dry_run: bool, cli: &Cli) {
    match version {
        Some(version) if cli.quiet => println!("{}", version),
        Some(version) => {
            let verb = if dry_run { "Would release" } else { "Released" };
            output::success(&format!(
                "{} {} ({})",
                verb,
                output::version_style().apply_to(version),
                kind
            ));
        }
        None if !cli.quiet => output::info(&format!("Nothing to release ({})", kind)),
        None => {}
    }
}

/// Publish a prerelease from the current branch
#[derive(Debug, Args)]
pub struct NextCommand {
    /// Dry run - don't make any changes
    #[arg(long)]
    pub dry_run: bool,
}

impl NextCommand {
    /// Execute the next command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, "executing next command");
        let liftoff = session::load(cli).await?;
        let version = liftoff.next(self.dry_run).await?;

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({ "version": version }))?,
            OutputFormat::Text => print_version(version.as_deref(), "next", self.dry_run, cli),
        }
        Ok(())
    }
}

/// Publish a canary build
#[derive(Debug, Args)]
pub struct CanaryCommand {
    /// Pull request the build belongs to
    #[arg(long)]
    pub pr: Option<u64>,

    /// CI build number
    #[arg(long)]
    pub build: Option<String>,

    /// Comment posted on the pull request, `%v` is replaced by the version
    #[arg(short, long)]
    pub message: Option<String>,

    /// Dry run - don't make any changes
    #[arg(long)]
    pub dry_run: bool,
}

impl CanaryCommand {
    /// Execute the canary command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    /// Options passed to the canary workflow
    pub fn options(&self) -> CanaryOptions {
        CanaryOptions {
            pr: self.pr,
            build: self.build.clone(),
            message: self.message.clone(),
            dry_run: self.dry_run,
        }
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(pr = ?self.pr, build = ?self.build, dry_run = self.dry_run, "executing canary command");
        let liftoff = session::load(cli).await?;
        let version = liftoff.canary(self.options()).await?;

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({ "version": version }))?,
            OutputFormat::Text => {
                if self.dry_run && !cli.quiet {
                    output::info("Dry run, no canary published");
                } else {
                    print_version(version.as_deref(), "canary", false, cli);
                }
            }
        }
        Ok(())
    }
}
