//! Lenient decoding for persisted records.
//!
//! Snapshots come back from the storage collaborator as untyped JSON that may
//! have been written by older builds or edited by hand: numbers can arrive as
//! strings, dates as full timestamps, ids as integers. The `deserialize_with`
//! helpers here coerce each field explicitly instead of trusting its shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a JSON value into a finite `f64` (number or numeric string).
pub fn to_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Coerce a JSON value into a non-negative integer that fits in `u32`.
pub fn to_count(value: &Value) -> Option<u32> {
    let n = to_number(value)?;
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(u32::MAX) {
        return None;
    }
    Some(n as u32)
}

/// Coerce a JSON value into text. `null` becomes the empty string.
pub fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Parse a calendar date from `YYYY-MM-DD` or a full timestamp (date part in UTC).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    parse_timestamp(s).map(|ts| ts.date_naive())
}

/// Parse an instant from RFC 3339, a zone-less `YYYY-MM-DDTHH:MM:SS[.f]`
/// (read as UTC) or a bare date (midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn value_to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        // Epoch milliseconds.
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let v = Value::deserialize(d)?;
    to_number(&v).ok_or_else(|| D::Error::custom(format!("expected a number, got {v}")))
}

pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = Value::deserialize(d)?;
    to_count(&v).ok_or_else(|| D::Error::custom(format!("expected a whole number, got {v}")))
}

pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    to_text(&v).ok_or_else(|| D::Error::custom(format!("expected text, got {v}")))
}

/// Optional text; `null`, missing and blank all decode to `None`.
pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Value::deserialize(d)?;
    let s = to_text(&v).ok_or_else(|| D::Error::custom(format!("expected text, got {v}")))?;
    Ok(if s.trim().is_empty() { None } else { Some(s) })
}

pub fn date<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let v = Value::deserialize(d)?;
    let parsed = match &v {
        Value::String(s) => parse_date(s),
        Value::Number(_) => value_to_timestamp(&v).map(|ts| ts.date_naive()),
        _ => None,
    };
    parsed.ok_or_else(|| D::Error::custom(format!("expected a date, got {v}")))
}

pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let v = Value::deserialize(d)?;
    value_to_timestamp(&v).ok_or_else(|| D::Error::custom(format!("expected a timestamp, got {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_accept_numeric_strings() {
        assert_eq!(to_number(&json!(2.5)), Some(2.5));
        assert_eq!(to_number(&json!(" 10 ")), Some(10.0));
        assert_eq!(to_number(&json!("abc")), None);
        assert_eq!(to_number(&json!(null)), None);
    }

    #[test]
    fn counts_reject_fractions_and_negatives() {
        assert_eq!(to_count(&json!("30")), Some(30));
        assert_eq!(to_count(&json!(7.0)), Some(7));
        assert_eq!(to_count(&json!(1.5)), None);
        assert_eq!(to_count(&json!(-1)), None);
    }

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        assert_eq!(parse_date("2024-03-14"), Some(expected));
        assert_eq!(parse_date("2024-03-14T10:30:00.000Z"), Some(expected));
        assert_eq!(parse_date("2024-03-14T10:30:00"), Some(expected));
        assert_eq!(parse_date("14/03/2024"), None);
    }

    #[test]
    fn timestamps_accept_epoch_millis() {
        let ts = value_to_timestamp(&json!(0)).unwrap();
        assert_eq!(ts, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn text_accepts_numbers_and_null() {
        assert_eq!(to_text(&json!(1712345)), Some("1712345".to_string()));
        assert_eq!(to_text(&json!(null)), Some(String::new()));
        assert_eq!(to_text(&json!({"a": 1})), None);
    }
}
