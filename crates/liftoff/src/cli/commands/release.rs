//! Release command

use clap::Args;
use tracing::info;

use liftoff_release::ReleaseOptions;

use crate::cli::{output, session, Cli, OutputFormat};

/// Publish a release on GitHub
#[derive(Debug, Args)]
pub struct ReleaseCommand {
    /// Release or git ref to start from (defaults to the latest release)
    #[arg(long)]
    pub from: Option<String>,

    /// Publish this version instead of the detected one
    #[arg(long)]
    pub use_version: Option<String>,

    /// Publish as a prerelease
    #[arg(long)]
    pub prerelease: bool,

    /// Dry run - don't make any changes
    #[arg(long)]
    pub dry_run: bool,
}

impl ReleaseCommand {
    /// Execute the release command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    fn options(&self) -> ReleaseOptions {
        ReleaseOptions {
            from: self.from.clone(),
            use_version: self.use_version.clone(),
            prerelease: self.prerelease,
            dry_run: self.dry_run,
        }
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            from = ?self.from,
            use_version = ?self.use_version,
            prerelease = self.prerelease,
            dry_run = self.dry_run,
            "executing release command"
        );
        let liftoff = session::load(cli).await?;
        let version = liftoff.run_release(self.options()).await?;

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({
                "version": version,
                "prerelease": self.prerelease,
                "dry_run": self.dry_run,
            }))?,
            OutputFormat::Text => match version {
                Some(version) if cli.quiet => println!("{}", version),
                Some(version) => {
                    let verb = if self.dry_run { "Would publish" } else { "Published" };
                    output::success(&format!(
                        "{} {}",
                        verb,
                        output::version_style().apply_to(version)
                    ));
                }
                None if !cli.quiet => output::info("No new version to release"),
                None => {}
            },
        }
        Ok(())
    }
}
