//! AdminHub deployment CLI - package the app and ship it to the VPS

use clap::Parser;

use adminhub_deploy::cli::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
