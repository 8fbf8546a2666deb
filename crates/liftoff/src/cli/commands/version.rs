//! Version command

use clap::Args;
use tracing::info;

use crate::cli::{output, session, Cli, OutputFormat};

/// Print the bump implied by the labels since the last release
#[derive(Debug, Args)]
pub struct VersionCommand {
    /// Release or git ref to start from (defaults to the latest release)
    #[arg(long)]
    pub from: Option<String>,
}

impl VersionCommand {
    /// Execute the version command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(from = ?self.from, "executing version command");
        let liftoff = session::load(cli).await?;
        let bump = liftoff.version(self.from.as_deref()).await?;

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({ "bump": bump }))?,
            OutputFormat::Text => println!("{}", bump),
        }
        Ok(())
    }
}
