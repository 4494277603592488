use rusqlite::Connection;

use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::{self, maintenance, migrate};
use crate::errors::AppResult;
use crate::ui::messages;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Db {
        migrate: run_migrate,
        check,
        compress,
        info,
    } = cmd
    {
        // One shared connection across all requested actions.
        let mut conn: Option<Connection> = None;

        fn get_conn<'a>(conn: &'a mut Option<Connection>, db_path: &str) -> AppResult<&'a Connection> {
            if conn.is_none() {
                *conn = Some(db::connect(db_path)?);
            }
            Ok(conn.as_ref().unwrap())
        }

        if *run_migrate {
            let conn = get_conn(&mut conn, &cfg.database)?;
            messages::info("Running migrations…");
            migrate::run_pending_migrations(conn)?;
            messages::success("Migration completed.");
        }

        if *info {
            let conn = get_conn(&mut conn, &cfg.database)?;
            let stats = maintenance::db_stats(conn, &cfg.database)?;
            println!("Database      : {}", cfg.database);
            println!("Status rows   : {}", stats.rows);
            println!("Size (bytes)  : {}", stats.size_bytes);
            println!("Page size     : {}", stats.page_size);
            println!("Freelist pages: {}", stats.freelist_pages);
        }

        if *check {
            let conn = get_conn(&mut conn, &cfg.database)?;
            messages::info("Running integrity check…");
            let integrity: String = conn.query_row("PRAGMA integrity_check;", [], |row| row.get(0))?;
            if integrity == "ok" {
                messages::success("Integrity check passed.");
            } else {
                messages::error(format!("Integrity check failed: {}", integrity));
            }
        }

        if *compress {
            let conn = get_conn(&mut conn, &cfg.database)?;
            messages::info("Running VACUUM…");
            maintenance::compress_db(conn)?;
            messages::success("Compaction completed.");
        }
    }

    Ok(())
}
