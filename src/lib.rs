//! chargewatch library root.
//! Exposes CLI parser, high-level run() function, and internal modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Stats => cli::commands::stats::handle(cfg),
        Commands::Analyze { .. } => cli::commands::analyze::handle(&cli.command, cfg),
        Commands::ScheduleFingerprints => cli::commands::schedule::handle(cfg),
        Commands::WorkFingerprints => cli::commands::worker::handle(cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load()?;

    // Command-line --db wins over both the config file and the environment.
    if let Some(custom_db) = &cli.db {
        cfg.database = custom_db.clone();
    }

    dispatch(&cli, &cfg)
}
