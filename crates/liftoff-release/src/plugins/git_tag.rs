//! Versioning through git tags alone

use tracing::{debug, info, warn};

use liftoff_core::error::Result;
use liftoff_core::version::{increment_str, next_prerelease, parse_version};

use crate::context::ReleaseContext;
use crate::hooks::{LifecycleHooks, NextContext, VersionArgs};
use crate::plugins::Plugin;

/// Version used when the project has never been tagged
const INITIAL_VERSION: &str = "0.0.0";

/// Tags releases and prereleases, and pushes the tags
#[derive(Debug, Clone, Copy, Default)]
pub struct GitTagPlugin;

/// A prerelease identifier derived from a branch name
fn prerelease_id(branch: &str) -> String {
    branch
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

/// The tag as a version, or the initial version when it is not one
fn version_or_initial(tag: Option<String>) -> String {
    tag.filter(|t| parse_version(t).is_ok())
        .unwrap_or_else(|| INITIAL_VERSION.to_string())
}

async fn tag_version(ctx: &ReleaseContext, args: VersionArgs) -> Result<()> {
    let last = version_or_initial(ctx.vcs.latest_tag_in_branch().await?);
    let next = ctx.prefix_release(&increment_str(&last, args.bump)?);

    if args.dry_run {
        info!(tag = %next, "would create tag");
        return Ok(());
    }

    ctx.vcs
        .create_tag(&next, &format!("Update version to {}", next))
        .await?;
    info!(tag = %next, "created tag");
    Ok(())
}

async fn push_tags(ctx: &ReleaseContext, branch: &str) -> Result<()> {
    if !ctx.config.git.push_tags {
        debug!("tag pushing disabled");
        return Ok(());
    }
    ctx.vcs.push_tags(&ctx.config.git.remote, branch).await
}

async fn tag_prerelease(ctx: &ReleaseContext, next: Result<NextContext>) -> Result<NextContext> {
    let mut next = next?;

    let latest = ctx.vcs.latest_tag_in_branch().await?;
    let last_release = version_or_initial(Some(next.last_release.clone()));
    let version = next_prerelease(
        &last_release,
        latest.as_deref().filter(|t| parse_version(t).is_ok()),
        next.bump,
        &prerelease_id(&next.branch),
    )?;
    let tag = ctx.prefix_release(&version.to_string());

    if next.dry_run {
        info!(tag = %tag, "would create prerelease tag");
    } else {
        ctx.vcs
            .create_tag(&tag, &format!("Update version to {}", tag))
            .await?;
        push_tags(ctx, &next.branch).await?;
        info!(tag = %tag, "created prerelease tag");
    }

    next.versions.push(tag);
    Ok(next)
}

impl Plugin for GitTagPlugin {
    fn name(&self) -> &'static str {
        "git-tag"
    }

    fn apply(&self, ctx: &ReleaseContext, hooks: &mut LifecycleHooks) {
        let plugin = self.name();

        let c = ctx.clone();
        hooks.get_previous_version.tap_async(plugin, move |_: ()| {
            let c = c.clone();
            async move {
                match c.vcs.latest_tag_in_branch().await {
                    Ok(tag) => tag.map(|t| c.prefix_release(&t)),
                    Err(e) => {
                        warn!(error = %e, "could not read latest tag");
                        None
                    }
                }
            }
        });

        let c = ctx.clone();
        hooks.version.tap_async(plugin, move |args: VersionArgs| {
            let c = c.clone();
            async move { tag_version(&c, args).await }
        });

        let c = ctx.clone();
        hooks.publish.tap_async(plugin, move |_| {
            let c = c.clone();
            async move { push_tags(&c, &c.config.base_branch).await }
        });

        let c = ctx.clone();
        hooks.next.tap_async(plugin, move |next: Result<NextContext>| {
            let c = c.clone();
            async move { tag_prerelease(&c, next).await }
        });
    }
}
