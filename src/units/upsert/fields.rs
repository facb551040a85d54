// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-field coercions applied while building a payload.
//!
//! None of these fail an entity. A value that cannot be coerced is reported
//! through [`DateIssue`] and the caller drops the field.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use crate::transport::FieldType;

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Shorten `value` to at most `max_length` characters, ending in the
/// ellipsis marker. `None` when the value already fits. Fields too short to
/// hold the marker get a plain cut.
///
/// ```
/// use entity_sync::units::upsert::fields::truncate;
///
/// assert_eq!(truncate("abcdefgh", 6).as_deref(), Some("abc..."));
/// assert_eq!(truncate("abcdefgh", 2).as_deref(), Some("ab"));
/// assert_eq!(truncate("abc", 6), None);
/// ```
pub fn truncate(value: &str, max_length: usize) -> Option<String> {
    if value.chars().count() <= max_length {
        return None;
    }
    if max_length <= ELLIPSIS.len() {
        return Some(value.chars().take(max_length).collect());
    }
    let keep = max_length - ELLIPSIS.len();
    let mut truncated: String = value.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    Some(truncated)
}

/// Why a temporal value was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateIssue {
    Empty,
    Malformed,
    NotPositive,
}

impl DateIssue {
    pub fn as_str(self) -> &'static str {
        match self {
            DateIssue::Empty => "value is empty",
            DateIssue::Malformed => "value is not a recognizable date",
            DateIssue::NotPositive => "timestamp is not after the epoch",
        }
    }
}

enum Parsed {
    /// A calendar date with no time of day; never shifted between zones.
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

fn parse(value: &Value) -> Result<Parsed, DateIssue> {
    match value {
        Value::Null => Err(DateIssue::Empty),
        Value::Number(n) => {
            let seconds = n.as_i64().ok_or(DateIssue::Malformed)?;
            Utc.timestamp_opt(seconds, 0)
                .single()
                .map(Parsed::Instant)
                .ok_or(DateIssue::Malformed)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(DateIssue::Empty);
            }
            if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
                return Ok(Parsed::Instant(instant.with_timezone(&Utc)));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Ok(Parsed::Instant(Utc.from_utc_datetime(&naive)));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Parsed::Day)
                .map_err(|_| DateIssue::Malformed)
        }
        _ => Err(DateIssue::Malformed),
    }
}

/// Coerce a raw value for a `date` or `datetime` field.
///
/// Instants are interpreted as UTC. Plain `date` fields are rendered as the
/// calendar day in `timezone`; `datetime` fields as RFC 3339 in UTC.
pub fn coerce_date(
    value: &Value,
    field_type: FieldType,
    timezone: FixedOffset,
) -> Result<Value, DateIssue> {
    let parsed = parse(value)?;
    let timestamp = match &parsed {
        Parsed::Day(day) => day
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().timestamp())
            .ok_or(DateIssue::Malformed)?,
        Parsed::Instant(instant) => instant.timestamp(),
    };
    if timestamp <= 0 {
        return Err(DateIssue::NotPositive);
    }

    let rendered = match (field_type, parsed) {
        (FieldType::Datetime, Parsed::Instant(instant)) => {
            instant.to_rfc3339_opts(SecondsFormat::Secs, true)
        }
        (FieldType::Datetime, Parsed::Day(day)) => day
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
            .ok_or(DateIssue::Malformed)?,
        (_, Parsed::Instant(instant)) => instant
            .with_timezone(&timezone)
            .format("%Y-%m-%d")
            .to_string(),
        (_, Parsed::Day(day)) => day.format("%Y-%m-%d").to_string(),
    };
    Ok(Value::String(rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_truncate_to_field_length() {
        let value: String = (0..130).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let truncated = truncate(&value, 100).unwrap();

        assert_eq!(truncated.chars().count(), 100);
        assert!(truncated.ends_with(ELLIPSIS));
        assert_eq!(&truncated[..97], &value[..97]);
    }

    #[test]
    fn test_truncate_never_exceeds_short_fields() {
        assert_eq!(truncate("abcdef", 3).as_deref(), Some("abc"));
        assert_eq!(truncate("abcdef", 1).as_deref(), Some("a"));
        assert_eq!(truncate("abcdef", 0).as_deref(), Some(""));
        assert_eq!(truncate("abcdef", 4).as_deref(), Some("a..."));
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("żółwiątko", 9), None);
        assert_eq!(truncate("żółwiątko", 6).as_deref(), Some("żół..."));
    }

    #[test]
    fn test_date_shifts_into_timezone() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let value = json!("2024-03-09T23:30:00Z");

        assert_eq!(coerce_date(&value, FieldType::Date, utc()), Ok(json!("2024-03-09")));
        assert_eq!(coerce_date(&value, FieldType::Date, plus_two), Ok(json!("2024-03-10")));
    }

    #[test]
    fn test_plain_day_is_not_shifted() {
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            coerce_date(&json!("2024-03-09"), FieldType::Date, minus_five),
            Ok(json!("2024-03-09"))
        );
    }

    #[test]
    fn test_datetime_renders_rfc3339_utc() {
        assert_eq!(
            coerce_date(&json!("2024-03-09 10:15:00"), FieldType::Datetime, utc()),
            Ok(json!("2024-03-09T10:15:00Z"))
        );
        assert_eq!(
            coerce_date(&json!(1_700_000_000), FieldType::Datetime, utc()),
            Ok(json!("2023-11-14T22:13:20Z"))
        );
    }

    #[test]
    fn test_bad_dates_are_reported() {
        assert_eq!(coerce_date(&json!(""), FieldType::Date, utc()), Err(DateIssue::Empty));
        assert_eq!(coerce_date(&json!("soon"), FieldType::Date, utc()), Err(DateIssue::Malformed));
        assert_eq!(coerce_date(&json!(0), FieldType::Datetime, utc()), Err(DateIssue::NotPositive));
        assert_eq!(
            coerce_date(&json!("1970-01-01 00:00:00"), FieldType::Date, utc()),
            Err(DateIssue::NotPositive)
        );
        assert_eq!(coerce_date(&json!("1969-07-20"), FieldType::Date, utc()), Err(DateIssue::NotPositive));
    }
}
