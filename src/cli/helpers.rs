//! Shared CLI helpers: time parsing, spinners and output files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use vmsquery::api::RequestLog;

/// Parse `YYYY-MM-DD` (midnight UTC), a naive `YYYY-MM-DDTHH:MM:SS` (UTC)
/// or a full RFC 3339 timestamp.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got {s:?}"))
}

/// Fill in a missing window: `to` defaults to now, `from` to a day before `to`.
pub fn time_window(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let to = to.unwrap_or_else(Utc::now);
    let from = from.unwrap_or_else(|| to - chrono::Duration::hours(24));
    (from, to)
}

/// Spinner shown while a request is in flight.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// File-system-safe version of an identifier such as a timestamp.
pub fn file_stem(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

pub fn output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", file_stem(stem), extension))
}

pub fn print_request_log(log: &RequestLog) {
    println!();
    println!("{}", style(format!("Request log ({} entries)", log.len())).bold());
    for entry in log.entries() {
        println!("{}", entry);
    }
}

pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_time_formats() {
        let midnight = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_time("2025-06-01").unwrap(), midnight);
        assert_eq!(parse_time("2025-06-01T00:00:00").unwrap(), midnight);
        assert_eq!(parse_time("2025-06-01T02:00:00+02:00").unwrap(), midnight);
        assert_eq!(parse_time("2025-06-01T00:00:00.000Z").unwrap(), midnight);
        assert!(parse_time("June 1st").is_err());
    }

    #[test]
    fn test_time_window_defaults() {
        let to = Utc.with_ymd_and_hms(2025, 6, 2, 12, 0, 0).unwrap();
        let (from, end) = time_window(None, Some(to));
        assert_eq!(end, to);
        assert_eq!(from, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("obj-1_2025-06-01T10:00:00.000Z"), "obj-1_2025-06-01T10_00_00_000Z");
    }

    #[test]
    fn test_write_file_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(&dir.path().join("crops"), "a:b", "jpg");
        write_file(&path, b"x").unwrap();
        assert_eq!(std::fs::read(dir.path().join("crops/a_b.jpg")).unwrap(), b"x");
    }
}
