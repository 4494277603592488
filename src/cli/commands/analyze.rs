use chrono::Utc;
use serde::Serialize;

use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::analyze::{ProblemStation, RuleCounts, analyze_chargers};
use crate::db;
use crate::errors::AppResult;
use crate::models::rules::Rules;

#[derive(Serialize)]
struct AnalyzeReport {
    rules: Rules,
    problematic: Vec<ProblemStation>,
    counts: RuleCounts,
}

/// Handle the `analyze` command: run the classifier and print JSON.
/// CLI flags override the configured thresholds one by one.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Analyze {
        unused_days,
        long_session_days,
        long_session_min,
        unavailable_hours,
    } = cmd
    {
        let mut rules = cfg.rules.clone();
        if let Some(days) = unused_days {
            rules.unused_days = *days;
        }
        if let Some(days) = long_session_days {
            rules.long_session_days = *days;
        }
        if let Some(min) = long_session_min {
            rules.long_session_min = *min;
        }
        if let Some(hours) = unavailable_hours {
            rules.unavailable_hours = *hours;
        }

        let conn = db::connect(&cfg.database)?;
        let (problematic, counts) = analyze_chargers(&conn, &rules, Utc::now(), None)?;
        let report = AnalyzeReport {
            rules,
            problematic,
            counts,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
