use crate::error::Result;
use crate::storage::{WatchedEvent, WatchedStore};
use chrono::{DateTime, Utc};
use colored::Colorize;
use prettytable::{format, Table};
use std::path::Path;

/// Print the most recently watched episodes
pub fn handle_history(db_path: &Path, limit: usize) -> Result<()> {
    let store = WatchedStore::new(db_path)?;
    let events = store.list_recent(limit)?;

    if events.is_empty() {
        println!("{}", "No watched episodes recorded.".yellow());
        return Ok(());
    }

    println!("\nWatched Episodes:");
    build_history_table(&events).printstd();
    println!();
    println!(
        "Showing {} of {} recorded episodes.",
        events.len(),
        store.count()?
    );
    println!();

    Ok(())
}

/// Table with one row per event, newest first as given
pub fn build_history_table(events: &[WatchedEvent]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "Watched At".bold(),
        "Series".bold(),
        "Episode".bold(),
        "Rating Key".bold()
    ]);

    for event in events {
        let series = if event.series.chars().count() > 40 {
            format!("{}...", event.series.chars().take(37).collect::<String>())
        } else {
            event.series.clone()
        };

        table.add_row(prettytable::row![
            format_timestamp(event.watched_at),
            series,
            format!("S{:02}E{:02}", event.season, event.episode).cyan(),
            event.rating_key.as_deref().unwrap_or("-")
        ]);
    }

    table
}

/// `YYYY-MM-DD HH:MM` in UTC, or the raw number if out of range
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::<Utc>::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => secs.to_string(),
    }
}
