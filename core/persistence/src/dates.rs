//! FILENAME: core/persistence/src/dates.rs
//! PURPOSE: Date-time conversions between chrono values, Excel serial numbers
//! and ISO-8601 text.
//! CONTEXT: Serials use the 1900 date system: days since 1899-12-30 with the
//! time of day as the fraction. Serials below 61 ignore Excel's fictitious
//! 1900-02-29.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Serial number of 1970-01-01.
const UNIX_EPOCH_SERIAL: f64 = 25569.0;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

pub fn date_to_serial(dt: &NaiveDateTime) -> f64 {
    UNIX_EPOCH_SERIAL + dt.and_utc().timestamp_millis() as f64 / MILLIS_PER_DAY
}

/// Returns None for non-finite serials or ones outside chrono's range.
pub fn serial_to_date(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - UNIX_EPOCH_SERIAL) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64).map(|dt| dt.naive_utc())
}

/// Accepts "2024-03-15", "2024-03-15T10:30:00", "2024-03-15 10:30:00",
/// fractional seconds, and RFC 3339 with an offset (converted to UTC).
pub fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(dt);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_iso_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}
