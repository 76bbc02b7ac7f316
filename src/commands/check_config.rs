use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use prettytable::{format, Table};
use std::path::Path;

/// Load the policy document once and print what it means
///
/// Parse failures are returned (non-zero exit). Validation problems are
/// printed as warnings since the server would still accept the document.
pub fn handle_check_config(path: &Path) -> Result<()> {
    let config = Config::load(path)?;

    println!("{} {}", "Configuration:".bold(), path.display());
    match &config.sonarr {
        Some(sonarr) => println!("  Sonarr:                 {}", sonarr.base_url().cyan()),
        None => println!("  Sonarr:                 {}", "not configured".yellow()),
    }
    println!(
        "  Unmonitor after delete: {}",
        config.unmonitor_after_delete
    );
    println!(
        "  Global grace period:    {}",
        describe_grace(config.grace_days)
    );

    if config.series_settings.is_empty() {
        println!("\n{}", "No per-series overrides.".yellow());
    } else {
        println!("\nSeries Overrides:");
        build_policy_table(&config).printstd();
    }
    println!();

    if let Err(e) = config.validate() {
        println!("{} {:#}", "Warning:".yellow().bold(), e);
    } else {
        println!("{}", "Configuration OK".green());
    }

    Ok(())
}

/// One row per override, in document order
pub fn build_policy_table(config: &Config) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row!["Series".bold(), "Grace Period".bold()]);

    for (series, settings) in config.series_settings.iter() {
        table.add_row(prettytable::row![series, describe_grace(settings.grace_days)]);
    }

    table
}

/// Human-readable grace period
pub fn describe_grace(grace_days: Option<i64>) -> String {
    match grace_days {
        Some(0) => "0 days (delete on watch)".to_string(),
        Some(1) => "1 day (kept)".to_string(),
        Some(days) => format!("{} days (kept)", days),
        None => "unset (kept)".to_string(),
    }
}
