//! CLI commands

mod changelog;
mod labels;
mod pr_check;
mod release;
mod shipit;
mod version;

pub use changelog::ChangelogCommand;
pub use labels::{CreateLabelsCommand, LabelCommand};
pub use pr_check::PrCheckCommand;
pub use release::ReleaseCommand;
pub use shipit::{CanaryCommand, NextCommand, ShipitCommand};
pub use version::VersionCommand;
