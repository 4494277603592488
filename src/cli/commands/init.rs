use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db;
use crate::errors::AppResult;
use crate::ui::messages;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file
///  - the SQLite database with all pending migrations
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.db.clone())?;

    messages::info(format!("Config file : {}", Config::config_file().display()));
    messages::info(format!("Database    : {}", cfg.database));

    // connect() runs migrations and an initial retention pass.
    db::connect(&cfg.database)?;

    messages::success(format!("Database initialized at {}", cfg.database));
    Ok(())
}
