//! Run timestamps and human-readable durations.

use chrono::{DateTime, Local};
use std::time::Duration;

/// Format used in checkpoint, loss-log and model filenames
pub const STAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

pub fn run_stamp(at: &DateTime<Local>) -> String {
    at.format(STAMP_FORMAT).to_string()
}

/// `HH:MM:SS`, with a day count in front once the run passes 24 hours
pub fn format_duration(elapsed: Duration) -> String {
    let total   = elapsed.as_secs();
    let days    = total / 86_400;
    let hours   = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    match days {
        0 => format!("{hours:02}:{minutes:02}:{seconds:02}"),
        1 => format!("1 day, {hours:02}:{minutes:02}:{seconds:02}"),
        d => format!("{d} days, {hours:02}:{minutes:02}:{seconds:02}"),
    }
}
