//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::commands;
use crate::config::{
    DeployTarget, DEFAULT_DEPLOY_PATH, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER,
};

/// Package the AdminHub app and ship it to the VPS
#[derive(Parser)]
#[command(
    name = "adminhub-deploy",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Package the project and deploy it to the VPS
    Deploy(DeployArgs),

    /// Show which project paths a deploy would ship
    Manifest(ManifestArgs),

    /// Show version
    Version,
}

/// Deployment target overrides. Every flag defaults to the compiled-in
/// production target, so a bare `deploy` needs no arguments.
#[derive(Args)]
pub struct DeployArgs {
    /// VPS host
    #[arg(long, env = "ADMINHUB_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// VPS SSH port
    #[arg(long, env = "ADMINHUB_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SSH user
    #[arg(long, env = "ADMINHUB_USER", default_value = DEFAULT_USER)]
    pub user: String,

    /// Remote deployment directory
    #[arg(long, env = "ADMINHUB_DEPLOY_PATH", default_value = DEFAULT_DEPLOY_PATH)]
    pub deploy_path: String,

    /// Project root containing the files to ship
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,
}

impl DeployArgs {
    /// The deployment target these arguments resolve to.
    #[must_use]
    pub fn target(&self) -> DeployTarget {
        DeployTarget {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            deploy_path: self.deploy_path.clone(),
        }
    }
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Project root containing the files to ship
    #[arg(long, default_value = ".")]
    pub project_root: PathBuf,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub fn run(self) -> Result<()> {
        let Cli { json, quiet, no_color, command } = self;
        match command {
            Command::Version => {
                commands::version::run(json);
                Ok(())
            }
            Command::Manifest(args) => {
                let ctx = crate::output::OutputContext::new(no_color, quiet);
                commands::manifest::run(&ctx, &args, json)
            }
            Command::Deploy(args) => {
                let ctx = crate::output::OutputContext::new(no_color, quiet);
                commands::deploy::run(&ctx, &args, &crate::ssh::Ssh2Connector)
            }
        }
    }
}
