//! Tolerant timestamp parsing for upstream date/time strings.
//!
//! Providers emit a mix of ISO 8601 shapes and space-separated variants, so
//! parsing walks an ordered list of patterns and takes the first one that
//! matches the whole input. Strings without an offset are read as UTC.
//! Date and clock fields are fixed-width (`2021-05-01`, `09:05:00`); padding,
//! single-digit fields and leap seconds are rejected.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DemographicsError;

// Placeholder date used to read a bare time through the date-time parser
const SCAFFOLD_DATE: &str = "2020-01-01";

#[derive(Clone, Copy, Debug)]
enum Zone {
    /// The pattern itself carries the offset
    Explicit,
    /// No offset in the text, interpret as UTC
    Utc,
}

#[derive(Clone, Copy, Debug)]
struct Pattern {
    format: &'static str,
    zone: Zone,
}

impl Pattern {
    const fn new(format: &'static str, zone: Zone) -> Self {
        Self { format, zone }
    }

    fn parse(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        match self.zone {
            Zone::Explicit => DateTime::parse_from_str(text, self.format).ok(),
            Zone::Utc => NaiveDateTime::parse_from_str(text, self.format)
                .ok()
                .map(|naive| naive.and_utc().fixed_offset()),
        }
    }
}

// Tried after RFC 3339, in order
const DATE_TIME_PATTERNS: &[Pattern] = &[
    Pattern::new("%Y-%m-%dT%H:%M:%S%.f", Zone::Utc),
    Pattern::new("%Y-%m-%dT%H:%M", Zone::Utc),
    Pattern::new("%Y-%m-%dT%H:%M:%S%.f%#z", Zone::Explicit),
    Pattern::new("%Y-%m-%dT%H:%M%#z", Zone::Explicit),
    Pattern::new("%Y-%m-%d %H:%M:%S%.f%#z", Zone::Explicit),
    Pattern::new("%Y-%m-%d %H:%M:%S%#z", Zone::Explicit),
    Pattern::new("%Y-%m-%d %H:%M:%S", Zone::Utc),
];

// Applied to "<SCAFFOLD_DATE>T<text>"
const TIME_PATTERNS: &[Pattern] = &[
    Pattern::new("%Y-%m-%dT%H:%M:%S%.f", Zone::Utc),
    Pattern::new("%Y-%m-%dT%H:%M", Zone::Utc),
    Pattern::new("%Y-%m-%dT%H:%M:%S%.f%#z", Zone::Explicit),
    Pattern::new("%Y-%m-%dT%H:%M%#z", Zone::Explicit),
];

fn digits(bytes: &[u8], range: Range<usize>) -> bool {
    bytes
        .get(range)
        .is_some_and(|field| field.iter().all(u8::is_ascii_digit))
}

/// `HH:MM` or `HH:MM:SS` at the start of `text`.
fn fixed_width_time(text: &str) -> bool {
    let bytes = text.as_bytes();
    let clock = digits(bytes, 0..2) && bytes.get(2) == Some(&b':') && digits(bytes, 3..5);
    match bytes.get(5) {
        Some(b':') => clock && digits(bytes, 6..8),
        _ => clock,
    }
}

/// `yyyy-MM-dd` then `T` or a space, then a fixed-width time.
fn fixed_width_date_time(text: &str) -> bool {
    let bytes = text.as_bytes();
    digits(bytes, 0..4)
        && bytes.get(4) == Some(&b'-')
        && digits(bytes, 5..7)
        && bytes.get(7) == Some(&b'-')
        && digits(bytes, 8..10)
        && matches!(bytes.get(10), Some(b'T' | b't' | b' '))
        && text.get(11..).is_some_and(fixed_width_time)
}

// chrono encodes second 60 as an overflowing nanosecond
fn is_leap_second(parsed: &DateTime<FixedOffset>) -> bool {
    parsed.nanosecond() >= 1_000_000_000
}

/// Parses a timestamp in any of the accepted shapes.
///
/// Accepted, in order of attempt:
/// * ISO 8601 / RFC 3339 date-time with offset, including the `Z` instant form
/// * ISO 8601 local date-time, with or without seconds (UTC)
/// * ISO 8601 date-time with an offset written as `+HH`, `+HHMM` or `+HH:MM`,
///   with or without seconds
/// * `yyyy-MM-dd HH:mm:ss.f±HH:MM`
/// * `yyyy-MM-dd HH:mm:ss±HH:MM`
/// * `yyyy-MM-dd HH:mm:ss` (UTC)
///
/// # Returns
/// * The instant with the offset it was written in
/// * `DemographicsError::TimestampParse` if no pattern matches the complete string
pub fn parse_date_time(text: &str) -> Result<DateTime<FixedOffset>, DemographicsError> {
    let rejected = || DemographicsError::TimestampParse(text.to_string());
    if !fixed_width_date_time(text) {
        return Err(rejected());
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .or_else(|| DATE_TIME_PATTERNS.iter().find_map(|pattern| pattern.parse(text)))
        .filter(|parsed| !is_leap_second(parsed))
        .ok_or_else(rejected)
}

/// Parses an ISO 8601 time of day, with or without an offset.
pub fn parse_time(text: &str) -> Result<OffsetTime, DemographicsError> {
    if !fixed_width_time(text) {
        return Err(DemographicsError::TimestampParse(text.to_string()));
    }
    let scaffolded = format!("{SCAFFOLD_DATE}T{text}");

    TIME_PATTERNS
        .iter()
        .find_map(|pattern| pattern.parse(&scaffolded))
        .filter(|parsed| !is_leap_second(parsed))
        .map(|parsed| OffsetTime {
            time: parsed.time(),
            offset: *parsed.offset(),
        })
        .ok_or_else(|| DemographicsError::TimestampParse(text.to_string()))
}

/// Time of day paired with a UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl fmt::Display for OffsetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.time.format("%H:%M:%S%.f"), self.offset)
    }
}

impl FromStr for OffsetTime {
    type Err = DemographicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_time(s)
    }
}

impl Serialize for OffsetTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OffsetTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_time(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde codec for `DateTime<FixedOffset>` fields.
///
/// Decodes through [`parse_date_time`] and encodes as RFC 3339, never as a
/// numeric timestamp. Use with `#[serde(with = "zip_demographics::datetime::flexible")]`.
pub mod flexible {
    use chrono::{DateTime, FixedOffset, SecondsFormat};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_date_time(&text).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<FixedOffset>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => super::serialize(dt, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(text) => super::super::parse_date_time(&text)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn space_separated_without_offset_is_utc() {
        let parsed = parse_date_time("2021-05-01 13:45:00").unwrap();
        assert_eq!(parsed, utc(2021, 5, 1, 13, 45, 0));
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn iso_with_offset_keeps_offset() {
        let parsed = parse_date_time("2021-05-01T13:45:00+02:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(parsed, utc(2021, 5, 1, 11, 45, 0));
    }

    #[test]
    fn instant_form() {
        let parsed = parse_date_time("2021-05-01T13:45:00.250Z").unwrap();
        assert_eq!(parsed.nanosecond(), 250_000_000);
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn iso_local_date_time_is_utc() {
        assert_eq!(
            parse_date_time("2021-05-01T13:45:00").unwrap(),
            utc(2021, 5, 1, 13, 45, 0)
        );
        assert_eq!(
            parse_date_time("2021-05-01T13:45").unwrap(),
            utc(2021, 5, 1, 13, 45, 0)
        );
    }

    #[test]
    fn space_separated_with_fraction_and_offset() {
        let parsed = parse_date_time("2021-05-01 13:45:00.5-05:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(parsed.nanosecond(), 500_000_000);
        assert_eq!(parsed, utc(2021, 5, 1, 18, 45, 0) + chrono::Duration::milliseconds(500));
    }

    #[test]
    fn space_separated_with_offset() {
        let parsed = parse_date_time("2021-05-01 13:45:00+0530").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn rejects_unmatched_text() {
        for text in ["not-a-date", "", "2021-05-01", "2021-05-01 13:45:00 trailing"] {
            match parse_date_time(text) {
                Err(DemographicsError::TimestampParse(rejected)) => assert_eq!(rejected, text),
                other => panic!("{text:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn hour_only_offset_with_or_without_seconds() {
        let with_seconds = parse_date_time("2021-05-01T13:45:00+02").unwrap();
        let without_seconds = parse_date_time("2021-05-01T13:45+02").unwrap();
        assert_eq!(with_seconds, without_seconds);
        assert_eq!(with_seconds.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(with_seconds, utc(2021, 5, 1, 11, 45, 0));
    }

    #[test]
    fn rejects_surrounding_whitespace() {
        for text in [
            " 2021-05-01 13:45:00",
            "2021-05-01 13:45:00 ",
            "\t2021-05-01T13:45:00Z",
            "2021-05-01T13:45:00Z\n",
        ] {
            assert!(parse_date_time(text).is_err(), "{text:?} should be rejected");
        }
        assert!(parse_time(" 13:45:00").is_err());
        assert!(parse_time("13:45:00 ").is_err());
    }

    #[test]
    fn rejects_short_fields() {
        for text in [
            "2021-5-01 13:45:00",
            "2021-05-1 13:45:00",
            "2021-05-01 1:45:00",
            "2021-05-01T13:5:00Z",
            "21-05-01 13:45:00",
        ] {
            assert!(parse_date_time(text).is_err(), "{text:?} should be rejected");
        }
        assert!(parse_time("1:45:00").is_err());
        assert!(parse_time("13:45:0").is_err());
    }

    #[test]
    fn rejects_leap_second() {
        assert!(parse_date_time("2021-05-01 13:45:60").is_err());
        assert!(parse_date_time("2016-12-31T23:59:60Z").is_err());
        assert!(parse_time("23:59:60").is_err());
    }

    #[test]
    fn time_without_offset_is_utc() {
        let parsed = parse_time("13:45:10").unwrap();
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(13, 45, 10).unwrap());
        assert_eq!(parsed.offset.local_minus_utc(), 0);
    }

    #[test]
    fn time_with_offset() {
        let parsed = parse_time("08:30:00-07:00").unwrap();
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(parsed.offset.local_minus_utc(), -7 * 3600);
        assert_eq!(parsed.to_string(), "08:30:00-07:00");
    }

    #[test]
    fn time_without_seconds() {
        let parsed: OffsetTime = "23:05Z".parse().unwrap();
        assert_eq!(parsed.time, NaiveTime::from_hms_opt(23, 5, 0).unwrap());
    }

    #[test]
    fn time_rejects_dates_and_garbage() {
        assert!(parse_time("2021-05-01T13:45:00").is_err());
        assert!(parse_time("noon").is_err());
        assert!(parse_time("25:00").is_err());
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Stamped {
        #[serde(with = "flexible")]
        updated: DateTime<FixedOffset>,
        #[serde(default, with = "flexible::option")]
        published: Option<DateTime<FixedOffset>>,
        #[serde(default)]
        opens: Option<OffsetTime>,
    }

    #[test]
    fn serde_fields_use_tolerant_parser() {
        let stamped: Stamped = serde_json::from_str(
            r#"{"updated":"2021-05-01 13:45:00","published":"2021-05-02T00:00:00+02:00","opens":"09:00:00+01:00"}"#,
        )
        .unwrap();
        assert_eq!(stamped.updated, utc(2021, 5, 1, 13, 45, 0));
        assert_eq!(stamped.published.unwrap(), utc(2021, 5, 1, 22, 0, 0));

        let encoded = serde_json::to_value(&stamped).unwrap();
        assert_eq!(encoded["updated"], "2021-05-01T13:45:00+00:00");
        assert_eq!(encoded["published"], "2021-05-02T00:00:00+02:00");
        assert_eq!(encoded["opens"], "09:00:00+01:00");
    }

    #[test]
    fn serde_field_rejects_bad_timestamp() {
        let err = serde_json::from_str::<Stamped>(r#"{"updated":"yesterday"}"#).unwrap_err();
        assert!(err.is_data());
    }
}
