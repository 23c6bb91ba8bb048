//! Command-line surface (§6.1): `mirror run`, `mirror discover`, `mirror
//! stop`. Grounded on `DecapodLabs-decapod`'s `clap::Parser`/`Subcommand`
//! derive layout.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::MirrorResult;

#[derive(Debug, Parser)]
#[command(name = "mirror", version, about = "Capture a self-contained offline mirror of a website")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Discover (if enabled in the config) and capture a full run.
    Run(RunArgs),
    /// Run the discovery crawler only, without capturing pages.
    Discover(DiscoverArgs),
    /// Signal a running capture/discovery job in the given run directory to stop.
    Stop(StopArgs),
}

#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Path to a TOML config file (see `Config::from_toml_file`).
    #[arg(long)]
    pub config: PathBuf,
    /// Additional seed URLs, appended to the config file's seeds.
    #[arg(long = "seed")]
    pub seeds: Vec<String>,
    /// Plan the run without launching a browser.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, clap::Args)]
pub struct DiscoverArgs {
    #[arg(long)]
    pub config: PathBuf,
    #[arg(long = "seed")]
    pub seeds: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct StopArgs {
    /// The `storage_dir` of the run to stop.
    #[arg(long)]
    pub run_dir: PathBuf,
}

/// Build the effective [`Config`] for `run`/`discover`, applying any
/// `--seed` overrides on top of the file's seed list.
pub fn load_config(config_path: &PathBuf, extra_seeds: &[String], dry_run: bool) -> MirrorResult<Config> {
    let mut config = Config::from_toml_file(config_path)?;
    config.seeds.extend(extra_seeds.iter().cloned());
    config.dry_run = dry_run || config.dry_run;
    Ok(config)
}

/// `mirror stop`: drop the `_crawl/STOP` sentinel a running orchestrator
/// polls for, without needing a handle to the in-process `Orchestrator`
/// that started it (§4.8 "Stop semantics" — stop is file-based so a
/// separate CLI invocation can request it).
pub fn stop_run(run_dir: &PathBuf) -> MirrorResult<()> {
    let crawl_dir = run_dir.join("_crawl");
    std::fs::create_dir_all(&crawl_dir)
        .map_err(|source| crate::error::MirrorError::Io { path: crawl_dir.clone(), source })?;
    std::fs::write(crawl_dir.join("STOP"), b"")
        .map_err(|source| crate::error::MirrorError::Io { path: crawl_dir.join("STOP"), source })?;
    Ok(())
}
