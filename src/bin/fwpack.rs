//! Firmware release packager.
//!
//! Usage:
//!   fwpack build-all            rebuild the release tree from projects.json
//!   fwpack build-all --upload   ...and publish it to the distribution server

use anyhow::{Context, Result};
use clap::Parser;
use fwpack::{Workspace, find_build_root};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "fwpack")]
#[command(version, about = "Package display firmware into versioned release trees")]
struct Cli {
    /// Command to run; only `build-all` is supported.
    command: Option<String>,
    /// Publish the release tree once every vendor is built.
    #[arg(long)]
    upload: bool,
    /// Build root holding projects.json and local-config.json (or set FWPACK_ROOT).
    #[arg(long)]
    root: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> Result<bool> {
    match cli.command.as_deref() {
        Some("build-all") => build_all(cli),
        _ => {
            usage();
            Ok(false)
        }
    }
}

fn usage() {
    eprintln!(
        "unknown or missing command\n\nUsage: fwpack build-all [--upload] [--root <DIR>] [-v]\n\nCommands:\n  build-all    Rebuild fw/<channel>/ from projects.json.\n\nOptions:\n  --upload     Publish the release tree after the build.\n  --root       Build root (defaults to FWPACK_ROOT or the enclosing directory holding projects.json)."
    );
}

fn build_all(cli: &Cli) -> Result<bool> {
    let root = find_build_root(cli.root.as_deref())?;
    let workspace =
        Workspace::load(&root).with_context(|| format!("loading build root {}", root.display()))?;
    let revision = workspace.revision()?;

    let report = workspace.build_all(&revision)?;
    let mut success = report.is_success();
    let failures: Vec<_> = report.failures().collect();
    if failures.is_empty() {
        info!(
            "built {} project(s) into {}",
            report.releases().count(),
            report.release_root.display()
        );
    } else {
        error!("{} project(s) incomplete:", failures.len());
        for failure in failures {
            error!("  {failure}");
        }
    }
    for vendor in &report.vendors {
        if let Some(err) = &vendor.index_error {
            error!("vendor {} has no index: {err}", vendor.vendor);
        }
    }

    if cli.upload {
        let upload = workspace.publish(&report)?;
        if !upload.is_success() {
            error!(
                "{} upload step(s) failed, {} completed",
                upload.failures.len(),
                upload.completed
            );
            success = false;
        }
    }

    Ok(success)
}
