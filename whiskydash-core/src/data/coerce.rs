//! Lenient type coercion for raw JSON fields.
//!
//! The API sends numbers both as JSON numbers and as strings. Every function
//! here is total: a value that cannot be read as the target type is `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Coerce to a finite `f64`.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace ignored).
/// Booleans, empty strings, NaN and infinities are missing.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Coerce to a non-negative whole count.
///
/// `"12"`, `12`, `12.0` and `"12.0"` all give 12; fractional or negative
/// values are missing.
pub fn coerce_count(value: &Value) -> Option<u64> {
    if let Value::Number(n) = value {
        if let Some(u) = n.as_u64() {
            return Some(u);
        }
    }
    let v = coerce_f64(value)?;
    if v < 0.0 || v.fract() != 0.0 || v > u64::MAX as f64 {
        return None;
    }
    Some(v as u64)
}

/// Coerce to a calendar date.
///
/// Accepted: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.f]`, `YYYY-MM-DD HH:MM:SS[.f]`
/// and RFC 3339 timestamps (time and offset are dropped).
pub fn coerce_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Coerce to a non-blank string. Numbers are rendered; everything else is missing.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_string_becomes_number() {
        assert_eq!(coerce_f64(&json!("87.5")), Some(87.5));
        assert_eq!(coerce_f64(&json!(" 87.5 ")), Some(87.5));
        assert_eq!(coerce_f64(&json!(87.5)), Some(87.5));
        assert_eq!(coerce_f64(&json!(90)), Some(90.0));
    }

    #[test]
    fn malformed_numbers_are_missing() {
        assert_eq!(coerce_f64(&json!("n/a")), None);
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!(null)), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!([1])), None);
        assert_eq!(coerce_f64(&json!({"v": 1})), None);
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
    }

    #[test]
    fn counts() {
        assert_eq!(coerce_count(&json!("12")), Some(12));
        assert_eq!(coerce_count(&json!("12.0")), Some(12));
        assert_eq!(coerce_count(&json!(12)), Some(12));
        assert_eq!(coerce_count(&json!(12.0)), Some(12));
        assert_eq!(coerce_count(&json!("12.5")), None);
        assert_eq!(coerce_count(&json!(-3)), None);
        assert_eq!(coerce_count(&json!("lots")), None);
    }

    #[test]
    fn dates() {
        let d = NaiveDate::from_ymd_opt(2023, 5, 31).unwrap();
        assert_eq!(coerce_date(&json!("2023-05-31")), Some(d));
        assert_eq!(coerce_date(&json!("2023-05-31T00:00:00")), Some(d));
        assert_eq!(coerce_date(&json!("2023-05-31 12:30:00")), Some(d));
        assert_eq!(coerce_date(&json!("2023-05-31T23:00:00+00:00")), Some(d));
        assert_eq!(coerce_date(&json!("2023-05-31T23:00:00Z")), Some(d));
    }

    #[test]
    fn malformed_dates_are_missing() {
        assert_eq!(coerce_date(&json!("2023-13-01")), None);
        assert_eq!(coerce_date(&json!("last tuesday")), None);
        assert_eq!(coerce_date(&json!("")), None);
        assert_eq!(coerce_date(&json!(20230531)), None);
        assert_eq!(coerce_date(&json!(null)), None);
    }

    #[test]
    fn strings() {
        assert_eq!(coerce_string(&json!(" Islay ")), Some("Islay".into()));
        assert_eq!(coerce_string(&json!("")), None);
        assert_eq!(coerce_string(&json!(null)), None);
        assert_eq!(coerce_string(&json!(7)), Some("7".into()));
    }
}
