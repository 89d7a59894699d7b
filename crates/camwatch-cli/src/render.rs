use anyhow::Result;
use camwatch_core::{projection, CameraRecord, CycleOutcome, RosterStats};

use crate::OutputFormat;

pub fn print_roster(
    records: &[&CameraRecord],
    stats: RosterStats,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Ndjson => {
            for record in records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
        OutputFormat::Human => {
            println!(
                "{} cameras ({} online, {} offline), {} shown",
                stats.total,
                stats.online,
                stats.offline,
                records.len()
            );
            println!(
                "{:<38} {:<24} {:<16} {:<8} {:<20} address",
                "id", "name", "ip", "status", "last check"
            );
            for record in records {
                println!(
                    "{:<38} {:<24} {:<16} {:<8} {:<20} {}",
                    record.id,
                    truncate(&record.name, 24),
                    record.ip,
                    record.status.as_str(),
                    format_check_time(record.last_check_at),
                    record.address
                );
            }
        }
    }
    Ok(())
}

pub fn print_cycle(
    snapshot: &[CameraRecord],
    outcome: CycleOutcome,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Ndjson => {
            let body = serde_json::json!({
                "checked": outcome.checked,
                "toggled": outcome.toggled,
                "skipped": outcome.skipped,
                "stats": projection::stats(snapshot),
            });
            if matches!(format, OutputFormat::Json) {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("{}", serde_json::to_string(&body)?);
            }
        }
        OutputFormat::Human => {
            let stats = projection::stats(snapshot);
            println!(
                "checked {} cameras, {} changed status ({} online, {} offline)",
                outcome.checked, outcome.toggled, stats.online, stats.offline
            );
            let active: Vec<&CameraRecord> = projection::active(snapshot).collect();
            print_roster(&active, stats, OutputFormat::Human)?;
        }
    }
    Ok(())
}

pub fn format_check_time(last_check_at: Option<i64>) -> String {
    use chrono::{TimeZone, Utc};
    match last_check_at.and_then(|ms| Utc.timestamp_millis_opt(ms).single()) {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "never".to_string(),
    }
}

/// First few characters of a credential, never the whole thing. Counts
/// characters, not bytes, so multi-byte tokens cannot split mid-char.
pub fn redact_token(token: &str) -> String {
    if token.is_empty() {
        "(unset)".to_string()
    } else {
        let prefix: String = token.chars().take(4).collect();
        format!("{prefix}…")
    }
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
