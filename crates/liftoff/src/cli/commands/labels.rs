//! Label commands

use clap::Args;
use tracing::info;

use crate::cli::{output, session, Cli, OutputFormat};

/// Create or update the configured labels on GitHub
#[derive(Debug, Args)]
pub struct CreateLabelsCommand {
    /// List the labels without writing them
    #[arg(long)]
    pub dry_run: bool,
}

impl CreateLabelsCommand {
    /// Execute the create-labels command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dry_run = self.dry_run, "executing create-labels command");
        let liftoff = session::load(cli).await?;
        let labels = liftoff.create_labels(self.dry_run).await?;

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({
                "labels": labels,
                "dry_run": self.dry_run,
            }))?,
            OutputFormat::Text if !cli.quiet => {
                for label in &labels {
                    println!("  {}", output::label_style().apply_to(label));
                }
                let verb = if self.dry_run { "Would write" } else { "Wrote" };
                output::success(&format!("{} {} labels", verb, labels.len()));
            }
            OutputFormat::Text => {}
        }
        Ok(())
    }
}

/// Print the labels of a pull request
#[derive(Debug, Args)]
pub struct LabelCommand {
    /// Pull request number (defaults to the most recently merged one)
    #[arg(long)]
    pub pr: Option<u64>,
}

impl LabelCommand {
    /// Execute the label command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(pr = ?self.pr, "executing label command");
        let liftoff = session::load(cli).await?;
        let labels = liftoff.label(self.pr).await?;

        match cli.format {
            OutputFormat::Json => output::json(&labels)?,
            OutputFormat::Text => {
                for label in &labels {
                    println!("{}", label);
                }
            }
        }
        Ok(())
    }
}
