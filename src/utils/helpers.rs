//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use base64::Engine;
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};
use rand::Rng;

const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789";

/// Length of store-generated document ids
pub const DOCUMENT_ID_LEN: usize = 20;

/// Generate a random alphanumeric document id
pub fn generate_document_id() -> String {
    let mut rng = rand::thread_rng();

    (0..DOCUMENT_ID_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ID_CHARSET.len());
            ID_CHARSET[idx] as char
        })
        .collect()
}

/// Month bucket key, `YYYY-MM`
pub fn month_key(timestamp: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", timestamp.year(), timestamp.month())
}

/// First instant of the month containing `timestamp`
pub fn start_of_month(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(timestamp.year(), timestamp.month(), 1)
        .unwrap_or_else(|| timestamp.date_naive());
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// First instant of the window of `months` months ending with `now`'s month
pub fn window_start(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let current = start_of_month(now);
    current
        .checked_sub_months(Months::new(months.saturating_sub(1)))
        .unwrap_or(current)
}

/// First instant after the month containing `now`
pub fn window_end(now: DateTime<Utc>) -> DateTime<Utc> {
    let current = start_of_month(now);
    current.checked_add_months(Months::new(1)).unwrap_or(current)
}

/// Month keys, oldest first, for the `months` months ending with `now`'s month
pub fn month_window(now: DateTime<Utc>, months: u32) -> Vec<String> {
    let start = window_start(now, months);
    (0..months)
        .filter_map(|offset| start.checked_add_months(Months::new(offset)))
        .map(month_key)
        .collect()
}

/// Round half away from negative infinity, matching `Math.round`
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Split ids into chunks of at most `size` entries
pub fn chunk_ids(ids: &[String], size: usize) -> Vec<Vec<String>> {
    if size == 0 {
        return vec![ids.to_vec()];
    }
    ids.chunks(size).map(|chunk| chunk.to_vec()).collect()
}

/// Decoded byte size of a base64 image payload, accepting `data:` URLs
pub fn decoded_len(payload: &str) -> Option<usize> {
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };

    base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()
        .map(|bytes| bytes.len())
}
