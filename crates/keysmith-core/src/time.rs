//! Time and duration utilities.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};

/// Format a duration in human-readable form.
pub fn pretty_duration(duration: Duration) -> String {
    let millis = duration.num_milliseconds();
    let secs = duration.num_seconds();

    if secs < 1 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        format!("{}h {}m", hours, mins)
    }
}

/// Render a modification timestamp (nanoseconds since the epoch) in local time.
pub fn format_mtime(nanos: u128) -> String {
    let secs = (nanos / 1_000_000_000) as i64;
    let sub = (nanos % 1_000_000_000) as u32;
    match Utc.timestamp_opt(secs, sub).single() {
        Some(ts) => to_local(ts).format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
        None => format!("@{}", nanos),
    }
}

/// Convert UTC timestamp to local time.
pub fn to_local(timestamp: DateTime<Utc>) -> DateTime<Local> {
    timestamp.with_timezone(&Local)
}
