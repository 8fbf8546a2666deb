//! Built-in plugins
//!
//! A plugin taps lifecycle hooks when a project is loaded. Plugins are
//! applied in the order they are listed in the configuration, after any taps
//! registered directly on [`crate::Liftoff::hooks`].
//!
//! Available plugins:
//! - `git-tag`: versions through git tags
//! - `conventional-commits`: labels from conventional commit subjects
//! - `exec`: shell commands on lifecycle hooks

mod conventional_commits;
mod exec;
mod git_tag;

pub use conventional_commits::ConventionalCommitsPlugin;
pub use exec::{ExecContext, ExecPlugin};
pub use git_tag::GitTagPlugin;

use crate::context::ReleaseContext;
use crate::hooks::LifecycleHooks;

/// Something that extends a release run by tapping its hooks
pub trait Plugin: Send + Sync {
    /// Name used in configuration
    fn name(&self) -> &'static str;

    /// Register taps for a loaded project
    fn apply(&self, ctx: &ReleaseContext, hooks: &mut LifecycleHooks);
}

/// Look up a built-in plugin by its configured name
pub fn builtin(name: &str) -> Option<Box<dyn Plugin>> {
    match name {
        "git-tag" => Some(Box::new(GitTagPlugin)),
        "conventional-commits" => Some(Box::new(ConventionalCommitsPlugin)),
        "exec" => Some(Box::new(ExecPlugin)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftoff_core::config::validation::BUILTIN_PLUGINS;

    #[test]
    fn test_every_builtin_resolves() {
        for name in BUILTIN_PLUGINS {
            let plugin = builtin(name).unwrap();
            assert_eq!(plugin.name(), *name);
        }
        assert!(builtin("npm").is_none());
    }
}
