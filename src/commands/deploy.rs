//! `adminhub-deploy deploy` — package the project and ship it to the VPS.
//!
//! The pipeline is strictly sequential. Fatal stages (archive, connect,
//! transfer) abort the run immediately and skip cleanup; Advisory stages
//! (remote deploy, cleanup) warn and continue. The policy table lives in
//! [`crate::stage`].

use std::path::Path;

use anyhow::{Context, Result};

use crate::archive;
use crate::cli::DeployArgs;
use crate::config::{self, DeployTarget};
use crate::error::StageError;
use crate::manifest;
use crate::output::{progress, OutputContext};
use crate::ssh::{shell_escape, Connect, Remote, Secret};
use crate::stage::Stage;

/// Outcome of a deployment run.
#[derive(Debug)]
pub struct DeploySummary {
    /// Manifest entries shipped.
    pub entries: usize,
    /// Bytes uploaded to the staging path.
    pub bytes_uploaded: u64,
    /// Exit status of the remote deploy script, if it ran to completion.
    pub remote_exit: Option<i32>,
    /// Advisory-stage problems, in the order they occurred.
    pub warnings: Vec<String>,
}

/// Run `adminhub-deploy deploy`.
///
/// # Errors
///
/// Returns an error when a Fatal stage fails; Advisory failures are
/// reported as warnings and do not fail the command.
pub fn run<C: Connect>(ctx: &OutputContext, args: &DeployArgs, connector: &C) -> Result<()> {
    let target = args.target();
    let password = capture_password(&target)?;
    let summary = execute(ctx, &target, &args.project_root, connector, &password)?;
    print_completion(ctx, &target, &summary);
    Ok(())
}

/// Read the password from `ADMINHUB_PASSWORD`, or prompt for it.
fn capture_password(target: &DeployTarget) -> Result<Secret> {
    if let Ok(value) = std::env::var("ADMINHUB_PASSWORD") {
        return Ok(Secret::new(value));
    }
    let value = dialoguer::Password::new()
        .with_prompt(format!(
            "Enter password for {}@{}",
            target.user,
            target.address()
        ))
        .interact()
        .context("reading password")?;
    Ok(Secret::new(value))
}

/// The deployment pipeline, separated from credential capture so tests can
/// drive it with a canned connector and password.
///
/// # Errors
///
/// Returns a [`StageError`]-wrapped error when a Fatal stage fails.
pub fn execute<C: Connect>(
    ctx: &OutputContext,
    target: &DeployTarget,
    project_root: &Path,
    connector: &C,
    password: &Secret,
) -> Result<DeploySummary> {
    ctx.header("AdminHub VPS Deployment");
    ctx.kv("Target:", &format!("{}@{}", target.user, target.address()));

    // Manifest
    ctx.info("Preparing files for transfer...");
    let entries = manifest::build(project_root);
    for entry in &entries {
        ctx.success(&entry.display_name());
    }
    if !ctx.quiet {
        println!();
        println!("  Total entries: {}", entries.len());
    }

    // Archive (fatal)
    let archive_path = project_root.join(config::ARCHIVE_NAME);
    let archive_size = fatal(Stage::Archive, archive::create(project_root, &entries, &archive_path))?;
    ctx.success(&format!("Archive created: {}", config::ARCHIVE_NAME));

    // Connect (fatal)
    ctx.info(&format!("Connecting to {}...", target.address()));
    let mut session = fatal(Stage::Connect, connector.connect(target, password))?;

    // Transfer (fatal). On failure the local archive stays on disk.
    ctx.info("Transferring files to VPS...");
    let pb = if ctx.show_progress() {
        Some(progress::bar(archive_size, "Uploading archive"))
    } else {
        None
    };
    let mut tick = |sent: u64| {
        if let Some(pb) = pb.as_ref() {
            pb.set_position(sent);
        }
    };
    let upload = session.upload(&archive_path, config::REMOTE_STAGING_PATH, &mut tick);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let bytes_uploaded = fatal(Stage::Transfer, upload)?;
    ctx.success("Files transferred");

    let mut warnings = Vec::new();

    // Staged-digest check (advisory)
    match verify_staged_digest(&mut session, &archive_path) {
        Ok(true) => ctx.success("Staged archive digest verified"),
        Ok(false) => advisory(ctx, &mut warnings, "staged archive digest mismatch"),
        Err(e) => advisory(
            ctx,
            &mut warnings,
            &format!("could not verify staged archive: {e:#}"),
        ),
    }

    // Remote deploy (advisory)
    ctx.info("Starting deployment on VPS...");
    let remote_exit = match session.exec(&deploy_script(&target.deploy_path)) {
        Ok(0) => {
            ctx.success("Remote deploy script finished");
            Some(0)
        }
        Ok(code) => {
            advisory(
                ctx,
                &mut warnings,
                &format!("remote deploy script exited with status {code}"),
            );
            Some(code)
        }
        Err(e) => {
            advisory(ctx, &mut warnings, &format!("remote deploy failed: {e}"));
            None
        }
    };

    // Cleanup (advisory). Local removal first, then the remote staging copy.
    ctx.info("Cleaning up...");
    if let Err(e) = std::fs::remove_file(&archive_path) {
        advisory(
            ctx,
            &mut warnings,
            &format!("could not remove {}: {e}", archive_path.display()),
        );
    }
    match session.exec_captured(&cleanup_script()) {
        Ok((0, _)) => {}
        Ok((code, _)) => advisory(
            ctx,
            &mut warnings,
            &format!("remote cleanup exited with status {code}"),
        ),
        Err(e) => advisory(ctx, &mut warnings, &format!("remote cleanup failed: {e}")),
    }
    ctx.success("Cleanup complete");

    Ok(DeploySummary {
        entries: entries.len(),
        bytes_uploaded,
        remote_exit,
        warnings,
    })
}

/// Combined remote command sequence, sent as a single invocation over one
/// channel: create/enter the deploy directory, extract the staged archive,
/// make the deploy script executable, run it.
#[must_use]
pub fn deploy_script(deploy_path: &str) -> String {
    let dir = shell_escape(deploy_path);
    let staged = shell_escape(config::REMOTE_STAGING_PATH);
    let script = config::REMOTE_DEPLOY_SCRIPT;
    format!("mkdir -p {dir} && cd {dir} && tar -xzf {staged} && chmod +x {script} && ./{script}")
}

/// Best-effort removal of the staged archive on the VPS.
#[must_use]
pub fn cleanup_script() -> String {
    format!("rm -f {}", shell_escape(config::REMOTE_STAGING_PATH))
}

/// Compare the local archive digest with `sha256sum` of the staged copy.
fn verify_staged_digest<R: Remote>(session: &mut R, archive_path: &Path) -> Result<bool> {
    let local = archive::sha256(archive_path)?;
    let (status, output) = session
        .exec_captured(&format!(
            "sha256sum {}",
            shell_escape(config::REMOTE_STAGING_PATH)
        ))
        .context("running remote sha256sum")?;
    anyhow::ensure!(status == 0, "remote sha256sum exited with status {status}");
    let remote = output
        .split_whitespace()
        .next()
        .context("empty sha256sum output")?;
    Ok(remote == local)
}

fn advisory(ctx: &OutputContext, warnings: &mut Vec<String>, msg: &str) {
    ctx.warn(msg);
    warnings.push(msg.to_string());
}

fn fatal<T, E>(stage: Stage, result: std::result::Result<T, E>) -> Result<T>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    debug_assert!(stage.is_fatal());
    result.map_err(|e| anyhow::Error::new(StageError { stage, source: e.into() }))
}

fn print_completion(ctx: &OutputContext, target: &DeployTarget, summary: &DeploySummary) {
    if ctx.quiet {
        return;
    }
    println!();
    ctx.header("Deployment Complete!");
    println!();
    ctx.kv("Entries shipped:", &summary.entries.to_string());
    ctx.kv("Bytes uploaded:", &summary.bytes_uploaded.to_string());
    println!();
    println!("  Access your application at:");
    println!("    {}", target.app_url());
    println!();
    println!("  Default credentials:");
    println!("    Email: {}", config::DEFAULT_ADMIN_EMAIL);
    println!("    Password: {}", config::DEFAULT_ADMIN_PASSWORD);
    println!();
    ctx.warn("Change the password immediately!");
    if !summary.warnings.is_empty() {
        println!();
        ctx.warn(&format!(
            "{} stage(s) reported problems; review the output above",
            summary.warnings.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_script_sequence_and_quoting() {
        let script = deploy_script("/root/adminhub");
        assert_eq!(
            script,
            "mkdir -p '/root/adminhub' && cd '/root/adminhub' && \
             tar -xzf '/tmp/adminhub-deploy.tar.gz' && \
             chmod +x vps-deploy.sh && ./vps-deploy.sh"
        );
    }

    #[test]
    fn test_deploy_script_escapes_hostile_path() {
        let script = deploy_script("/srv/it's here");
        assert!(script.starts_with("mkdir -p '/srv/it'\\''s here'"));
        // The embedded quote never terminates the quoting early.
        assert!(!script.contains("mkdir -p '/srv/it's"));
    }

    #[test]
    fn test_cleanup_script_targets_staging_path() {
        assert_eq!(cleanup_script(), "rm -f '/tmp/adminhub-deploy.tar.gz'");
    }
}
