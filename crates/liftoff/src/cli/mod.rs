//! CLI definition and command handling

pub mod commands;
pub mod output;
mod session;

use clap::{Parser, Subcommand};

use commands::{
    CanaryCommand, ChangelogCommand, CreateLabelsCommand, LabelCommand, NextCommand,
    PrCheckCommand, ReleaseCommand, ShipitCommand, VersionCommand,
};

/// Liftoff - label-driven semantic release CLI
#[derive(Debug, Parser)]
#[command(name = "liftoff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the bump implied by the labels since the last release
    Version(VersionCommand),

    /// Prepend release notes to the changelog
    Changelog(ChangelogCommand),

    /// Publish a release on GitHub
    Release(ReleaseCommand),

    /// Version, tag, changelog and publish in one step
    Shipit(ShipitCommand),

    /// Publish a prerelease from the current branch
    Next(NextCommand),

    /// Publish a canary build
    Canary(CanaryCommand),

    /// Create or update the configured labels on GitHub
    CreateLabels(CreateLabelsCommand),

    /// Print the labels of a pull request
    Label(LabelCommand),

    /// Post a commit status describing a pull request's labels
    PrCheck(PrCheckCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Version(ref cmd) => cmd.execute(&self),
            Commands::Changelog(ref cmd) => cmd.execute(&self),
            Commands::Release(ref cmd) => cmd.execute(&self),
            Commands::Shipit(ref cmd) => cmd.execute(&self),
            Commands::Next(ref cmd) => cmd.execute(&self),
            Commands::Canary(ref cmd) => cmd.execute(&self),
            Commands::CreateLabels(ref cmd) => cmd.execute(&self),
            Commands::Label(ref cmd) => cmd.execute(&self),
            Commands::PrCheck(ref cmd) => cmd.execute(&self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["liftoff", "shipit", "--dry-run", "-q", "--format", "json"])
            .unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Shipit(ref cmd) if cmd.dry_run));
    }

    #[test]
    fn test_pr_check_requires_pr() {
        assert!(Cli::try_parse_from(["liftoff", "pr-check"]).is_err());
        let cli = Cli::try_parse_from(["liftoff", "pr-check", "--pr", "12"]).unwrap();
        assert!(matches!(cli.command, Commands::PrCheck(ref cmd) if cmd.pr == 12));
    }

    #[test]
    fn test_canary_options() {
        let cli = Cli::try_parse_from([
            "liftoff", "canary", "--pr", "7", "--build", "42", "-m", "Try `%v`",
        ])
        .unwrap();
        let Commands::Canary(cmd) = cli.command else {
            panic!("expected canary");
        };
        let options = cmd.options();
        assert_eq!(options.pr, Some(7));
        assert_eq!(options.build.as_deref(), Some("42"));
        assert_eq!(options.message.as_deref(), Some("Try `%v`"));
        assert!(!options.dry_run);
    }
}
