//! Small formatting helpers for terminal output.

use chrono::{DateTime, Local};

/// Human readable size, e.g. `1.5 KB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Render an RFC 3339 timestamp in local time, or pass it through unchanged
pub fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| format_local(t.with_timezone(&Local)))
        .unwrap_or_else(|_| raw.to_string())
}

pub fn format_local(t: DateTime<Local>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn warning(message: &str) {
    eprintln!("\x1b[33m⚠️  Warning: {}\x1b[0m", message);
}

pub fn gray(message: &str) {
    println!("\x1b[90m{}\x1b[0m", message);
}
