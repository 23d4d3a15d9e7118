//! Lenient field deserializers for data service rows.
//!
//! The data service returns rows straight out of the warehouse, so the
//! same logical field can arrive as a string, a number, `null`, or not at
//! all. Each helper here maps every shape to one well-defined Rust value
//! and never fails the enclosing row.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes a string or number into a trimmed, non-empty string.
///
/// Integral floats lose their fractional part (`10001.0` becomes
/// `"10001"`), which is how numeric zip codes and ids come back from the
/// warehouse.
///
/// # Errors
///
/// Never fails for well-formed JSON; the `Result` is required by serde.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(string_from_value))
}

/// Decodes a number or numeric string into a finite `f64`.
///
/// # Errors
///
/// Never fails for well-formed JSON; the `Result` is required by serde.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(f64_from_value))
}

/// Decodes a non-negative integral count.
///
/// # Errors
///
/// Never fails for well-formed JSON; the `Result` is required by serde.
pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(count_from_value))
}

/// Decodes a count, defaulting to zero when it is missing or invalid.
///
/// # Errors
///
/// Never fails for well-formed JSON; the `Result` is required by serde.
pub fn count_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_count(deserializer)?.unwrap_or(0))
}

/// Decodes an ISO-8601 date or date-time into a calendar date.
///
/// Only the leading `YYYY-MM-DD` is considered, so `"2024-03-05"`,
/// `"2024-03-05T00:00:00"` and `"2024-03-05 00:00:00+00"` all decode to
/// the same day.
///
/// # Errors
///
/// Never fails for well-formed JSON; the `Result` is required by serde.
pub fn opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(parse_date_prefix))
}

/// Decodes a list of strings, skipping blank and non-string entries.
///
/// `null` and a missing field both decode to an empty list. A single
/// bare string decodes to a one-element list.
///
/// # Errors
///
/// Never fails for well-formed JSON; the `Result` is required by serde.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    })
}

fn string_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                n.as_f64().filter(|f| f.is_finite()).map(|f| {
                    if f.fract() == 0.0 {
                        format!("{f:.0}")
                    } else {
                        f.to_string()
                    }
                })
            }
        }
        _ => None,
    }
}

fn f64_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

fn count_from_value(value: &Value) -> Option<u32> {
    if let Value::Number(n) = value
        && let Some(u) = n.as_u64()
    {
        return u32::try_from(u).ok();
    }

    let f = f64_from_value(value)?;
    if f < 0.0 || f.fract() != 0.0 || f > f64::from(u32::MAX) {
        return None;
    }
    // Bounds are checked above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(f as u32)
}

fn parse_date_prefix(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let prefix = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
