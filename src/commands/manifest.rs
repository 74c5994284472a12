//! `adminhub-deploy manifest` — preview which paths a deploy would ship.

use anyhow::{Context, Result};

use crate::cli::ManifestArgs;
use crate::manifest;
use crate::output::OutputContext;

/// Run `adminhub-deploy manifest [--project-root <dir>]`.
///
/// # Errors
///
/// Returns an error only in `--json` mode if serialization fails.
pub fn run(ctx: &OutputContext, args: &ManifestArgs, json: bool) -> Result<()> {
    let entries = manifest::build(&args.project_root);

    if json {
        let rendered =
            serde_json::to_string_pretty(&entries).context("serializing manifest")?;
        println!("{rendered}");
        return Ok(());
    }

    if entries.is_empty() {
        ctx.warn("no deployable paths found in this directory");
        return Ok(());
    }

    ctx.header("Deployment manifest:");
    for entry in &entries {
        ctx.success(&entry.display_name());
    }
    if !ctx.quiet {
        println!();
        println!("  Total entries: {}", entries.len());
    }
    Ok(())
}
