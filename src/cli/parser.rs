use clap::{Parser, Subcommand};

/// Command-line interface definition for chargewatch
/// Operational tooling for the charging-port status store
#[derive(Parser)]
#[command(
    name = "chargewatch",
    version = env!("CARGO_PKG_VERSION"),
    about = "Store and analyze EV charging port status history in SQLite",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the database (integrity checks, compaction, info)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "compress", help = "Reclaim free space using VACUUM")]
        compress: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print dashboard statistics as JSON
    Stats,

    /// Flag problematic stations and print them as JSON
    Analyze {
        #[arg(long = "unused-days", help = "Days without usage before a station is flagged")]
        unused_days: Option<i64>,

        #[arg(
            long = "long-session-days",
            help = "Window in days to look for a long session"
        )]
        long_session_days: Option<i64>,

        #[arg(
            long = "long-session-min",
            help = "Minimum session length in minutes to count as long"
        )]
        long_session_min: Option<f64>,

        #[arg(
            long = "unavailable-hours",
            help = "Continuous hours with all ports unavailable"
        )]
        unavailable_hours: Option<i64>,
    },

    /// Queue a fingerprint regeneration job for every known station
    ScheduleFingerprints,

    /// Drain the fingerprint job queue: claim, generate, save
    WorkFingerprints,
}
