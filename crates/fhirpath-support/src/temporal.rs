//! Partial-precision date, time and dateTime values.
//!
//! FHIR allows `2012`, `2012-04` and `2012-04-19` as valid dates, and times
//! that stop at any component. Comparison follows FHIRPath: values are
//! compared component by component, and when one side runs out of precision
//! before a difference is found the comparison has no answer.

use crate::error::ConversionError;
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use std::cmp::Ordering;
use std::fmt;

/// A calendar date stopping at year, month or day precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// A time of day stopping at hour, minute, second or millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialTime {
    pub hour: u32,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub millisecond: Option<u32>,
}

/// A date with an optional time of day and UTC offset (in minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDateTime {
    pub date: PartialDate,
    pub time: Option<PartialTime>,
    pub offset_minutes: Option<i32>,
}

impl PartialDate {
    /// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    pub fn parse(text: &str) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::literal("Date", text);
        let mut parts = text.split('-');

        let year = parts
            .next()
            .filter(|y| y.len() == 4)
            .and_then(parse_digits)
            .ok_or_else(invalid)? as i32;
        let month = match parts.next() {
            Some(m) => Some(
                parse_two_digits(m)
                    .filter(|m| (1..=12).contains(m))
                    .ok_or_else(invalid)?,
            ),
            None => None,
        };
        let day = match parts.next() {
            Some(d) => Some(parse_two_digits(d).ok_or_else(invalid)?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        if let (Some(month), Some(day)) = (month, day) {
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        }

        Ok(Self { year, month, day })
    }

    fn is_full(&self) -> bool {
        self.day.is_some()
    }
}

impl PartialTime {
    /// Parses `hh`, `hh:mm`, `hh:mm:ss` or `hh:mm:ss.fff` (extra fraction
    /// digits beyond milliseconds are dropped).
    pub fn parse(text: &str) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::literal("Time", text);
        let (clock, fraction) = match text.split_once('.') {
            Some((clock, fraction)) => (clock, Some(fraction)),
            None => (text, None),
        };
        let mut parts = clock.split(':');

        let hour = parts
            .next()
            .and_then(parse_two_digits)
            .filter(|h| *h < 24)
            .ok_or_else(invalid)?;
        let minute = match parts.next() {
            Some(m) => Some(parse_two_digits(m).filter(|m| *m < 60).ok_or_else(invalid)?),
            None => None,
        };
        let second = match parts.next() {
            Some(s) => Some(parse_two_digits(s).filter(|s| *s < 60).ok_or_else(invalid)?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        let millisecond = match fraction {
            Some(digits) => {
                if second.is_none()
                    || digits.is_empty()
                    || !digits.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(invalid());
                }
                let padded: String = digits.chars().chain("000".chars()).take(3).collect();
                Some(padded.parse::<u32>().map_err(|_| invalid())?)
            }
            None => None,
        };

        Ok(Self {
            hour,
            minute,
            second,
            millisecond,
        })
    }
}

impl PartialDateTime {
    /// Parses a FHIR `dateTime`/`instant`: a partial date, optionally
    /// followed by `T`, a partial time and a `Z` or `±hh:mm` offset.
    pub fn parse(text: &str) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::literal("DateTime", text);
        let (date_text, rest) = match text.split_once('T') {
            Some((date, rest)) => (date, Some(rest)),
            None => (text, None),
        };
        let date = PartialDate::parse(date_text).map_err(|_| invalid())?;

        let Some(rest) = rest.filter(|r| !r.is_empty()) else {
            return Ok(Self {
                date,
                time: None,
                offset_minutes: None,
            });
        };
        if !date.is_full() {
            return Err(invalid());
        }

        let (time_text, offset_minutes) = split_offset(rest).ok_or_else(invalid)?;
        let time = PartialTime::parse(time_text).map_err(|_| invalid())?;

        Ok(Self {
            date,
            time: Some(time),
            offset_minutes,
        })
    }

    /// Promotes a date to a dateTime of the same precision.
    pub fn from_date(date: PartialDate) -> Self {
        Self {
            date,
            time: None,
            offset_minutes: None,
        }
    }

    /// Shifts the value to UTC when it carries both a time and an offset.
    ///
    /// Values without an offset are taken to already be in UTC. An hour-only
    /// time shifted by an offset that is not a whole number of hours gains
    /// the minute it lands on.
    pub fn normalized(&self) -> Self {
        let (Some(time), Some(offset), Some(month), Some(day)) =
            (self.time, self.offset_minutes, self.date.month, self.date.day)
        else {
            return *self;
        };

        let Some(naive) = NaiveDate::from_ymd_opt(self.date.year, month, day).and_then(|d| {
            NaiveTime::from_hms_milli_opt(
                time.hour,
                time.minute.unwrap_or(0),
                time.second.unwrap_or(0),
                time.millisecond.unwrap_or(0),
            )
            .map(|t| NaiveDateTime::new(d, t))
        }) else {
            return *self;
        };
        let Some(zone) = FixedOffset::east_opt(offset * 60) else {
            return *self;
        };
        let Some(local) = zone.from_local_datetime(&naive).single() else {
            return *self;
        };
        let utc = local.naive_utc();

        Self {
            date: PartialDate {
                year: utc.year(),
                month: Some(utc.month()),
                day: Some(utc.day()),
            },
            time: Some(PartialTime {
                hour: utc.hour(),
                minute: (time.minute.is_some() || offset % 60 != 0).then(|| utc.minute()),
                second: time.second.map(|_| utc.second()),
                millisecond: time.millisecond.map(|_| utc.nanosecond() / 1_000_000),
            }),
            offset_minutes: Some(0),
        }
    }

    fn components(&self) -> [Option<i64>; 6] {
        let time = self.time;
        [
            Some(self.date.year as i64),
            self.date.month.map(i64::from),
            self.date.day.map(i64::from),
            time.map(|t| t.hour as i64),
            time.and_then(|t| t.minute).map(i64::from),
            time.and_then(seconds_with_millis),
        ]
    }

    /// Compares two values after normalizing both to UTC.
    ///
    /// Returns `None` when the values agree up to the shorter precision but
    /// one of them is more precise.
    pub fn partial_compare(&self, other: &Self) -> Option<Ordering> {
        compare_components(&self.normalized().components(), &other.normalized().components())
    }

    /// True when both values are stated to the same precision.
    pub fn same_precision(&self, other: &Self) -> bool {
        let left = self.components();
        let right = other.components();
        left.iter().zip(right.iter()).all(|(l, r)| l.is_some() == r.is_some())
    }
}

impl PartialTime {
    fn components(&self) -> [Option<i64>; 3] {
        [
            Some(self.hour as i64),
            self.minute.map(i64::from),
            seconds_with_millis(*self),
        ]
    }

    /// Compares two times; `None` when precision differs over an equal prefix.
    pub fn partial_compare(&self, other: &Self) -> Option<Ordering> {
        compare_components(&self.components(), &other.components())
    }

    pub fn same_precision(&self, other: &Self) -> bool {
        self.components()
            .iter()
            .zip(other.components().iter())
            .all(|(l, r)| l.is_some() == r.is_some())
    }
}

impl PartialDate {
    pub fn partial_compare(&self, other: &Self) -> Option<Ordering> {
        PartialDateTime::from_date(*self).partial_compare(&PartialDateTime::from_date(*other))
    }
}

// Seconds and milliseconds form a single precision level.
fn seconds_with_millis(time: PartialTime) -> Option<i64> {
    time.second
        .map(|s| s as i64 * 1000 + time.millisecond.unwrap_or(0) as i64)
}

fn compare_components(left: &[Option<i64>], right: &[Option<i64>]) -> Option<Ordering> {
    for (l, r) in left.iter().zip(right.iter()) {
        match (l, r) {
            (Some(l), Some(r)) => {
                if l != r {
                    return Some(l.cmp(r));
                }
            }
            (None, None) => return Some(Ordering::Equal),
            _ => return None,
        }
    }
    Some(Ordering::Equal)
}

fn split_offset(text: &str) -> Option<(&str, Option<i32>)> {
    if let Some(time) = text.strip_suffix('Z') {
        return Some((time, Some(0)));
    }
    match text.rfind(['+', '-']) {
        Some(pos) => {
            let (time, zone) = text.split_at(pos);
            let sign = if zone.starts_with('-') { -1 } else { 1 };
            let (hours, minutes) = zone[1..].split_once(':')?;
            let hours = parse_two_digits(hours).filter(|h| *h <= 14)?;
            let minutes = parse_two_digits(minutes).filter(|m| *m < 60)?;
            Some((time, Some(sign * (hours * 60 + minutes) as i32)))
        }
        None => Some((text, None)),
    }
}

fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn parse_two_digits(text: &str) -> Option<u32> {
    if text.len() != 2 {
        return None;
    }
    parse_digits(text)
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{:02}", month)?;
        }
        if let Some(day) = self.day {
            write!(f, "-{:02}", day)?;
        }
        Ok(())
    }
}

impl fmt::Display for PartialTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.hour)?;
        if let Some(minute) = self.minute {
            write!(f, ":{:02}", minute)?;
        }
        if let Some(second) = self.second {
            write!(f, ":{:02}", second)?;
        }
        if let Some(ms) = self.millisecond {
            write!(f, ".{:03}", ms)?;
        }
        Ok(())
    }
}

impl fmt::Display for PartialDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date)?;
        if let Some(time) = &self.time {
            write!(f, "T{}", time)?;
            match self.offset_minutes {
                Some(0) => write!(f, "Z")?,
                Some(offset) => {
                    let sign = if offset < 0 { '-' } else { '+' };
                    let offset = offset.abs();
                    write!(f, "{}{:02}:{:02}", sign, offset / 60, offset % 60)?;
                }
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_dates() {
        assert_eq!(
            PartialDate::parse("2012").unwrap(),
            PartialDate { year: 2012, month: None, day: None }
        );
        assert_eq!(PartialDate::parse("2012-04").unwrap().month, Some(4));
        assert!(PartialDate::parse("2012-02-30").is_err());
        assert!(PartialDate::parse("12-01-01").is_err());
        assert!(PartialDate::parse("2012-13").is_err());
    }

    #[test]
    fn test_parse_date_time_with_offset() {
        let dt = PartialDateTime::parse("2015-02-07T13:28:17-05:00").unwrap();
        assert_eq!(dt.offset_minutes, Some(-300));
        assert_eq!(dt.to_string(), "2015-02-07T13:28:17-05:00");

        let utc = dt.normalized();
        assert_eq!(utc.to_string(), "2015-02-07T18:28:17Z");
    }

    #[test]
    fn test_normalize_hour_with_half_hour_offset() {
        let dt = PartialDateTime::parse("2015-02-07T10+05:30").unwrap();
        let utc = dt.normalized().time.unwrap();
        assert_eq!((utc.hour, utc.minute), (4, Some(30)));

        let same = PartialDateTime::parse("2015-02-07T04:30Z").unwrap();
        assert_eq!(dt.partial_compare(&same), Some(Ordering::Equal));
        let hour_only = PartialDateTime::parse("2015-02-07T04Z").unwrap();
        assert_eq!(dt.partial_compare(&hour_only), None);

        let whole_hour = PartialDateTime::parse("2015-02-07T10+05:00").unwrap();
        assert_eq!(whole_hour.normalized().time.unwrap().minute, None);
    }

    #[test]
    fn test_time_requires_full_date() {
        assert!(PartialDateTime::parse("2015-02T10:00:00").is_err());
        assert!(PartialDateTime::parse("2015-02-07T").unwrap().time.is_none());
    }

    #[test]
    fn test_parse_time_fraction() {
        let t = PartialTime::parse("10:30:00.5").unwrap();
        assert_eq!(t.millisecond, Some(500));
        assert!(PartialTime::parse("10:30.5").is_err());
        assert!(PartialTime::parse("25:00").is_err());
    }

    #[test]
    fn test_compare_across_offsets() {
        let a = PartialDateTime::parse("2015-02-07T13:28:17-05:00").unwrap();
        let b = PartialDateTime::parse("2015-02-07T18:28:17Z").unwrap();
        assert_eq!(a.partial_compare(&b), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_different_precision() {
        let year = PartialDateTime::parse("2012").unwrap();
        let day = PartialDateTime::parse("2012-04-01").unwrap();
        let other_year = PartialDateTime::parse("2013-01").unwrap();
        assert_eq!(year.partial_compare(&day), None);
        assert_eq!(year.partial_compare(&other_year), Some(Ordering::Less));
    }

    #[test]
    fn test_seconds_and_millis_share_precision() {
        let a = PartialTime::parse("10:30:00").unwrap();
        let b = PartialTime::parse("10:30:00.000").unwrap();
        assert_eq!(a.partial_compare(&b), Some(Ordering::Equal));
    }
}
