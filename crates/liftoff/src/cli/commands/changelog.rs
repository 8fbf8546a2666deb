//! Changelog command

use clap::Args;
use tracing::info;

use crate::cli::{output, session, Cli, OutputFormat};

/// Prepend release notes to the changelog
#[derive(Debug, Args)]
pub struct ChangelogCommand {
    /// Release or git ref to start from (defaults to the latest release)
    #[arg(long)]
    pub from: Option<String>,

    /// Git ref to end at (defaults to HEAD)
    #[arg(long)]
    pub to: Option<String>,

    /// Print the notes without writing the changelog
    #[arg(long)]
    pub dry_run: bool,
}

impl ChangelogCommand {
    /// Execute the changelog command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        session::block_on(self.execute_async(cli))?
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(from = ?self.from, to = ?self.to, dry_run = self.dry_run, "executing changelog command");
        let liftoff = session::load(cli).await?;
        let notes = liftoff
            .changelog(self.from.as_deref(), self.to.as_deref(), self.dry_run)
            .await?;
        let path = liftoff.release()?.changelog_path();
        let written = !self.dry_run && !notes.is_empty();

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({
                "notes": notes,
                "path": path,
                "written": written,
            }))?,
            OutputFormat::Text => {
                if notes.is_empty() {
                    if !cli.quiet {
                        output::info("No changes since the last release");
                    }
                } else if self.dry_run {
                    println!("{}", notes);
                } else if !cli.quiet {
                    output::success(&format!(
                        "Updated {}",
                        output::path_style().apply_to(path.display())
                    ));
                }
            }
        }
        Ok(())
    }
}
