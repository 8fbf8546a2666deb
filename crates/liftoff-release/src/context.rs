//! Shared handles for the release pipeline and plugins

use std::path::PathBuf;
use std::sync::Arc;

use liftoff_core::config::Config;
use liftoff_core::labels::VersionLabels;
use liftoff_core::provider::Provider;
use liftoff_core::vcs::Vcs;

/// Everything a release run talks to, cheap to clone
#[derive(Clone)]
pub struct ReleaseContext {
    /// Effective configuration
    pub config: Arc<Config>,
    /// Version control
    pub vcs: Arc<dyn Vcs>,
    /// Code-hosting platform
    pub provider: Arc<dyn Provider>,
    /// Release type → label names
    pub version_labels: VersionLabels,
    /// Project root; relative paths in the configuration resolve against it
    pub root: PathBuf,
}

impl ReleaseContext {
    /// Create a context
    pub fn new(
        config: Arc<Config>,
        vcs: Arc<dyn Vcs>,
        provider: Arc<dyn Provider>,
        version_labels: VersionLabels,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config,
            vcs,
            provider,
            version_labels,
            root: root.into(),
        }
    }

    /// Prefix a version with `v` unless the configuration disables it
    pub fn prefix_release(&self, version: &str) -> String {
        liftoff_core::version::prefix_release(version, self.config.no_version_prefix)
    }
}

impl std::fmt::Debug for ReleaseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseContext")
            .field("config", &self.config)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
