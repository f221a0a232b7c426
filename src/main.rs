//! jackstrip - A JACK channel strip mixer with TUI
//!
//! Lays volume/balance channel strips over a JACK gain matrix. Features:
//! - Mono-to-stereo and stereo-to-stereo strips
//! - YAML configuration for ports, strips and persisted gains
//! - Master/slave volume links between strips
//! - Terminal-based user interface

mod audio;
mod config;
mod ipc;
mod mixer;
mod routing;
mod strip;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use routing::{GainMatrix, JackRouting};

/// jackstrip - JACK channel strip mixer
#[derive(Parser, Debug)]
#[command(name = "jackstrip")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run against an in-memory gain matrix instead of JACK
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    log::info!("Starting jackstrip");

    let config = config::Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    log::info!(
        "Loaded config: client='{}', {} inputs, {} outputs, {} strips",
        config.client_name,
        config.inputs.len(),
        config.outputs.len(),
        config.strips.len()
    );

    if args.dry_run {
        let matrix = GainMatrix::with_routes(config.routes());
        log::info!("Dry run with {} persisted routes", matrix.len());
        ui::App::new(config, matrix)?.run()?;
    } else {
        let routing = JackRouting::new(&config)?;
        let mut routing = ui::App::new(config, routing)?.run()?;
        routing.quit();
    }

    log::info!("jackstrip exiting");
    Ok(())
}
