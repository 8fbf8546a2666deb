//! PR check command

use clap::Args;
use tracing::info;

use liftoff_core::provider::StatusState;

use crate::cli::{output, session, Cli, OutputFormat};

/// Post a commit status describing a pull request's labels
#[derive(Debug, Args)]
pub struct PrCheckCommand {
    /// Pull request number
    #[arg(long)]
    pub pr: u64,

    /// Link attached to the status
    #[arg(long)]
    pub url: Option<String>,

    /// Print the status without posting it
    #[arg(long)]
    pub dry_run: bool,
}

impl PrCheckCommand {
    /// Execute the pr-check command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(pr = self.pr, dry_run = self.dry_run, "executing pr-check command");
        let liftoff = session::load(cli).await?;
        let status = liftoff
            .pr_check(self.pr, self.url.as_deref(), self.dry_run)
            .await?;

        match cli.format {
            OutputFormat::Json => output::json(&status)?,
            OutputFormat::Text if cli.quiet => {}
            OutputFormat::Text => {
                let line = format!("#{} {}", self.pr, status.description);
                match status.state {
                    StatusState::Success => output::success(&line),
                    StatusState::Pending => output::info(&line),
                    StatusState::Error | StatusState::Failure => output::warning(&line),
                }
                println!("{}", output::key_value("Context", &status.context));
                println!("{}", output::key_value("Commit", &status.sha));
            }
        }
        Ok(())
    }
}
