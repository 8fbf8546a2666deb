//! Shell commands bound to lifecycle hooks
//!
//! Commands come from the `exec` section of the configuration, keyed by hook
//! name. Each runs through `sh -c` in the project root with the release
//! state exported as `LIFTOFF_*` variables. Commands of one hook run in
//! order; a failing command stops the hook unless `fail_on_error` is off.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, info, warn};

use liftoff_core::config::ExecHookConfig;
use liftoff_core::error::{PublishError, Result};

use crate::context::ReleaseContext;
use crate::hooks::{AfterReleaseArgs, LifecycleHooks, ShipitOutcome, VersionArgs};
use crate::plugins::Plugin;

/// Release state exported to commands
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    /// Version being released
    pub version: Option<String>,
    /// Version released before
    pub previous_version: Option<String>,
    /// Bump being applied
    pub bump: Option<String>,
    /// Whether this is a dry run
    pub dry_run: bool,
    /// Additional variables
    pub custom: HashMap<String, String>,
}

impl ExecContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the previous version
    pub fn with_previous_version(mut self, version: impl Into<String>) -> Self {
        self.previous_version = Some(version.into());
        self
    }

    /// Set the bump
    pub fn with_bump(mut self, bump: impl Into<String>) -> Self {
        self.bump = Some(bump.into());
        self
    }

    /// Set dry run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Add a custom variable, exported as `LIFTOFF_<KEY>`
    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    /// Convert the context to environment variables
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();

        if let Some(ref v) = self.version {
            env.insert("LIFTOFF_VERSION".to_string(), v.clone());
        }
        if let Some(ref v) = self.previous_version {
            env.insert("LIFTOFF_PREVIOUS_VERSION".to_string(), v.clone());
        }
        if let Some(ref v) = self.bump {
            env.insert("LIFTOFF_BUMP".to_string(), v.clone());
        }
        env.insert("LIFTOFF_DRY_RUN".to_string(), self.dry_run.to_string());

        for (k, v) in &self.custom {
            env.insert(format!("LIFTOFF_{}", k.to_uppercase()), v.clone());
        }

        env
    }
}

/// Runs configured shell commands on lifecycle hooks
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecPlugin;

/// Commands bound to one hook, with the directory they resolve against
#[derive(Debug, Clone)]
struct CommandSet {
    hook: &'static str,
    root: PathBuf,
    commands: Arc<Vec<ExecHookConfig>>,
}

impl CommandSet {
    fn new(ctx: &ReleaseContext, hook: &'static str) -> Option<Self> {
        let commands = ctx.config.exec.get(hook).filter(|c| !c.is_empty())?;
        Some(Self {
            hook,
            root: ctx.root.clone(),
            commands: Arc::new(commands.clone()),
        })
    }

    /// Run every command in order
    async fn run(&self, context: ExecContext) -> Result<()> {
        if context.dry_run {
            for command in self.commands.iter() {
                info!(hook = self.hook, command = command.command(), "would run command");
            }
            return Ok(());
        }

        let env = context.to_env();
        for command in self.commands.iter() {
            run_command(self.hook, &self.root, command, &env).await?;
        }
        Ok(())
    }
}

async fn run_command(
    hook: &str,
    root: &Path,
    config: &ExecHookConfig,
    context_env: &HashMap<String, String>,
) -> Result<()> {
    let (cwd, extra_env, fail_on_error) = match config {
        ExecHookConfig::Command(_) => (None, None, true),
        ExecHookConfig::Detailed {
            cwd,
            env,
            fail_on_error,
            ..
        } => (cwd.as_deref(), Some(env), *fail_on_error),
    };
    let command = config.command();
    let dir = cwd.map_or_else(|| root.to_path_buf(), |cwd| root.join(cwd));

    debug!(hook, command, dir = %dir.display(), "running command");

    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(&dir)
        .envs(context_env)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(extra) = extra_env {
        cmd.envs(extra);
    }

    let output = cmd
        .output()
        .await
        .map_err(|e| PublishError::hook(hook, format!("`{}` could not start: {}", command, e)))?;

    if output.status.success() {
        debug!(hook, command, "command succeeded");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = format!(
        "`{}` exited with {}: {}",
        command,
        output
            .status
            .code()
            .map_or_else(|| "a signal".to_string(), |c| c.to_string()),
        stderr.trim()
    );
    if fail_on_error {
        return Err(PublishError::hook(hook, message).into());
    }
    warn!(hook, "{}", message);
    Ok(())
}

impl Plugin for ExecPlugin {
    fn name(&self) -> &'static str {
        "exec"
    }

    fn apply(&self, ctx: &ReleaseContext, hooks: &mut LifecycleHooks) {
        let plugin = self.name();

        if let Some(set) = CommandSet::new(ctx, "before-run") {
            hooks.before_run.tap_async(plugin, move |_| {
                let set = set.clone();
                async move { set.run(ExecContext::new()).await }
            });
        }

        if let Some(set) = CommandSet::new(ctx, "version") {
            hooks.version.tap_async(plugin, move |args: VersionArgs| {
                let set = set.clone();
                async move {
                    let context = ExecContext::new()
                        .with_bump(args.bump.as_str())
                        .with_dry_run(args.dry_run);
                    set.run(context).await
                }
            });
        }

        if let Some(set) = CommandSet::new(ctx, "publish") {
            hooks.publish.tap_async(plugin, move |bump| {
                let set = set.clone();
                async move { set.run(ExecContext::new().with_bump(bump.as_str())).await }
            });
        }

        if let Some(set) = CommandSet::new(ctx, "after-release") {
            hooks
                .after_release
                .tap_async(plugin, move |args: AfterReleaseArgs| {
                    let set = set.clone();
                    async move {
                        let context = ExecContext::new()
                            .with_version(args.new_version)
                            .with_previous_version(args.last_release)
                            .with_custom("prerelease", args.prerelease.to_string());
                        set.run(context).await
                    }
                });
        }

        if let Some(set) = CommandSet::new(ctx, "after-shipit") {
            hooks
                .after_ship_it
                .tap_async(plugin, move |outcome: ShipitOutcome| {
                    let set = set.clone();
                    async move {
                        let mut context =
                            ExecContext::new().with_custom("context", outcome.context.as_str());
                        if let Some(version) = outcome.new_version {
                            context = context.with_version(version);
                        }
                        set.run(context).await
                    }
                });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{first_error, ShipitContext};
    use crate::testing::{context, MockProvider, MockVcs};
    use liftoff_core::config::Config;
    use liftoff_core::types::SemverBump;
    use tempfile::TempDir;

    fn setup(exec: Vec<(&str, Vec<ExecHookConfig>)>) -> (LifecycleHooks, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        for (hook, commands) in exec {
            config.exec.insert(hook.to_string(), commands);
        }
        let ctx = context(
            config,
            Arc::new(MockVcs::new()),
            Arc::new(MockProvider::new()),
            temp.path(),
        );
        let mut hooks = LifecycleHooks::new();
        ExecPlugin.apply(&ctx, &mut hooks);
        (hooks, temp)
    }

    fn command(cmd: &str) -> ExecHookConfig {
        ExecHookConfig::Command(cmd.to_string())
    }

    #[test]
    fn test_context_to_env() {
        let env = ExecContext::new()
            .with_version("v1.2.0")
            .with_bump("minor")
            .with_custom("context", "latest")
            .to_env();

        assert_eq!(env.get("LIFTOFF_VERSION"), Some(&"v1.2.0".to_string()));
        assert_eq!(env.get("LIFTOFF_BUMP"), Some(&"minor".to_string()));
        assert_eq!(env.get("LIFTOFF_CONTEXT"), Some(&"latest".to_string()));
        assert_eq!(env.get("LIFTOFF_DRY_RUN"), Some(&"false".to_string()));
        assert!(!env.contains_key("LIFTOFF_PREVIOUS_VERSION"));
    }

    #[test]
    fn test_only_configured_hooks_tapped() {
        let (hooks, _temp) = setup(vec![("publish", vec![command("true")])]);
        assert!(hooks.publish.is_tapped());
        assert!(!hooks.version.is_tapped());
        assert!(!hooks.after_release.is_tapped());
    }

    #[tokio::test]
    async fn test_commands_see_release_env() {
        let (hooks, temp) = setup(vec![(
            "after-release",
            vec![command("echo \"$LIFTOFF_PREVIOUS_VERSION $LIFTOFF_VERSION $LIFTOFF_PRERELEASE\" > out.txt")],
        )]);

        let results = hooks
            .after_release
            .call(AfterReleaseArgs {
                last_release: "v1.0.0".to_string(),
                new_version: "v1.1.0".to_string(),
                commits: Vec::new(),
                release_notes: String::new(),
                prerelease: false,
            })
            .await;
        first_error(results).unwrap();

        let out = std::fs::read_to_string(temp.path().join("out.txt")).unwrap();
        assert_eq!(out.trim(), "v1.0.0 v1.1.0 false");
    }

    #[tokio::test]
    async fn test_failing_command() {
        let (hooks, _temp) = setup(vec![("publish", vec![command("echo nope >&2; exit 3")])]);
        let err = first_error(hooks.publish.call(SemverBump::Patch).await).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("publish"));
        assert!(message.contains("exited with 3: nope"));
    }

    #[tokio::test]
    async fn test_failure_tolerated_when_configured() {
        let detailed = ExecHookConfig::Detailed {
            command: "exit 1".to_string(),
            cwd: None,
            env: HashMap::new(),
            fail_on_error: false,
        };
        let (hooks, temp) = setup(vec![("after-shipit", vec![detailed, command("touch done")])]);

        let results = hooks
            .after_ship_it
            .call(ShipitOutcome {
                context: ShipitContext::Latest,
                new_version: Some("v1.1.0".to_string()),
                commits: Vec::new(),
            })
            .await;
        first_error(results).unwrap();
        assert!(temp.path().join("done").exists());
    }

    #[tokio::test]
    async fn test_dry_run_runs_nothing() {
        let (hooks, temp) = setup(vec![("version", vec![command("touch tagged")])]);
        let results = hooks
            .version
            .call(VersionArgs {
                bump: SemverBump::Minor,
                dry_run: true,
            })
            .await;
        first_error(results).unwrap();
        assert!(!temp.path().join("tagged").exists());
    }
}
