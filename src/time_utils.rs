// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Placeholder for missing timestamps.
pub const TIME_NOT_SPECIFIED: &str = "Time not specified";

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a backend timestamp for display.
///
/// RFC3339 values are shown in UTC, naive ISO values as-is (minute
/// precision). Anything else (e.g. "08:00") is passed through; blank values
/// become [`TIME_NOT_SPECIFIED`].
pub fn display_time(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return TIME_NOT_SPECIFIED.to_string();
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return date
            .with_timezone(&Utc)
            .format("%Y-%m-%d %H:%M UTC")
            .to_string();
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format("%Y-%m-%d %H:%M").to_string();
    }

    raw.to_string()
}
