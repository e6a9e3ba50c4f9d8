//! System-level values and the FHIRPath conversion table.
//!
//! A [`SystemValue`] is what a node looks like to the evaluator once its FHIR
//! typing is stripped away: `FHIR.code`, `FHIR.uri` and `FHIR.string` all
//! project to `System.String`, `FHIR.positiveInt` to `System.Integer`, and so
//! on. Conversions, equality and equivalence are defined here once and shared
//! by every node kind.

use crate::error::{Conversion, ConversionError};
use crate::temporal::{PartialDate, PartialDateTime, PartialTime};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Unit used for quantities that were promoted from plain numbers.
pub const DEFAULT_UNIT: &str = "1";

/// A decimal value paired with its unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quantity {
    pub value: Decimal,
    pub unit: String,
}

impl Quantity {
    pub fn new(value: Decimal, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    /// Parses `"4.5 'mg'"`, `"4.5 mg"` or a bare number (unit `'1'`).
    pub fn parse(text: &str) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::literal("Quantity", text);
        let trimmed = text.trim();
        let (number, unit) = match trimmed.split_once(char::is_whitespace) {
            Some((number, unit)) => (number, unit.trim()),
            None => (trimmed, ""),
        };
        let value = parse_decimal_literal(number).ok_or_else(invalid)?;
        let unit = if unit.is_empty() {
            DEFAULT_UNIT.to_string()
        } else if let Some(quoted) = unit.strip_prefix('\'').and_then(|u| u.strip_suffix('\'')) {
            if quoted.is_empty() {
                return Err(invalid());
            }
            quoted.to_string()
        } else if unit.chars().all(char::is_alphabetic) {
            unit.to_string()
        } else {
            return Err(invalid());
        };
        Ok(Self { value, unit })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.value, self.unit)
    }
}

/// A value of the FHIRPath System type system.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemValue {
    Boolean(bool),
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Date(PartialDate),
    DateTime(PartialDateTime),
    Time(PartialTime),
    Quantity(Quantity),
}

impl SystemValue {
    /// Name of the System type this value belongs to.
    pub fn type_name(&self) -> &'static str {
        match self {
            SystemValue::Boolean(_) => "Boolean",
            SystemValue::String(_) => "String",
            SystemValue::Integer(_) => "Integer",
            SystemValue::Decimal(_) => "Decimal",
            SystemValue::Date(_) => "Date",
            SystemValue::DateTime(_) => "DateTime",
            SystemValue::Time(_) => "Time",
            SystemValue::Quantity(_) => "Quantity",
        }
    }

    pub fn to_boolean(&self, explicit: bool) -> Conversion<bool> {
        match self {
            SystemValue::Boolean(b) => Ok(Some(*b)),
            _ if !explicit => Ok(None),
            SystemValue::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" | "1.0" => Ok(Some(true)),
                "false" | "f" | "no" | "n" | "0" | "0.0" => Ok(Some(false)),
                _ => Err(ConversionError::literal("Boolean", s.as_str())),
            },
            SystemValue::Integer(i) => match i {
                1 => Ok(Some(true)),
                0 => Ok(Some(false)),
                other => Err(ConversionError::out_of_domain("Boolean", other)),
            },
            SystemValue::Decimal(d) => {
                if *d == Decimal::ONE {
                    Ok(Some(true))
                } else if d.is_zero() {
                    Ok(Some(false))
                } else {
                    Err(ConversionError::out_of_domain("Boolean", d))
                }
            }
            _ => Ok(None),
        }
    }

    pub fn to_system_string(&self, explicit: bool) -> Conversion<String> {
        match self {
            SystemValue::String(s) => Ok(Some(s.clone())),
            _ if !explicit => Ok(None),
            SystemValue::Boolean(b) => Ok(Some(b.to_string())),
            SystemValue::Integer(i) => Ok(Some(i.to_string())),
            SystemValue::Decimal(d) => Ok(Some(d.to_string())),
            SystemValue::Date(d) => Ok(Some(d.to_string())),
            SystemValue::DateTime(dt) => Ok(Some(dt.to_string())),
            SystemValue::Time(t) => Ok(Some(t.to_string())),
            SystemValue::Quantity(q) => Ok(Some(q.to_string())),
        }
    }

    pub fn to_integer(&self, explicit: bool) -> Conversion<i64> {
        match self {
            SystemValue::Integer(i) => Ok(Some(*i)),
            _ if !explicit => Ok(None),
            SystemValue::String(s) => parse_integer_literal(s)
                .map(Some)
                .ok_or_else(|| ConversionError::literal("Integer", s.as_str())),
            SystemValue::Boolean(b) => Ok(Some(i64::from(*b))),
            _ => Ok(None),
        }
    }

    pub fn to_decimal(&self, explicit: bool) -> Conversion<Decimal> {
        match self {
            SystemValue::Decimal(d) => Ok(Some(*d)),
            SystemValue::Integer(i) => Ok(Some(Decimal::from(*i))),
            _ if !explicit => Ok(None),
            SystemValue::String(s) => parse_decimal_literal(s)
                .map(Some)
                .ok_or_else(|| ConversionError::literal("Decimal", s.as_str())),
            SystemValue::Boolean(b) => Ok(Some(if *b { Decimal::ONE } else { Decimal::ZERO })),
            _ => Ok(None),
        }
    }

    pub fn to_date(&self, explicit: bool) -> Conversion<PartialDate> {
        match self {
            SystemValue::Date(d) => Ok(Some(*d)),
            _ if !explicit => Ok(None),
            SystemValue::DateTime(dt) => Ok(Some(dt.date)),
            SystemValue::String(s) => PartialDate::parse(s).map(Some),
            _ => Ok(None),
        }
    }

    pub fn to_date_time(&self, explicit: bool) -> Conversion<PartialDateTime> {
        match self {
            SystemValue::DateTime(dt) => Ok(Some(*dt)),
            SystemValue::Date(d) => Ok(Some(PartialDateTime::from_date(*d))),
            _ if !explicit => Ok(None),
            SystemValue::String(s) => PartialDateTime::parse(s).map(Some),
            _ => Ok(None),
        }
    }

    pub fn to_time(&self, explicit: bool) -> Conversion<PartialTime> {
        match self {
            SystemValue::Time(t) => Ok(Some(*t)),
            _ if !explicit => Ok(None),
            SystemValue::String(s) => PartialTime::parse(s).map(Some),
            _ => Ok(None),
        }
    }

    pub fn to_quantity(&self, explicit: bool) -> Conversion<Quantity> {
        match self {
            SystemValue::Quantity(q) => Ok(Some(q.clone())),
            SystemValue::Integer(i) => Ok(Some(Quantity::new(Decimal::from(*i), DEFAULT_UNIT))),
            SystemValue::Decimal(d) => Ok(Some(Quantity::new(*d, DEFAULT_UNIT))),
            _ if !explicit => Ok(None),
            SystemValue::String(s) => Quantity::parse(s).map(Some),
            SystemValue::Boolean(b) => Ok(Some(Quantity::new(
                if *b { Decimal::ONE } else { Decimal::ZERO },
                DEFAULT_UNIT,
            ))),
            _ => Ok(None),
        }
    }

    /// FHIRPath `=`.
    ///
    /// `None` means the two values cannot be meaningfully compared (different
    /// System types, incompatible units, or temporal values whose precision
    /// differs over an equal prefix).
    pub fn equal(&self, other: &SystemValue) -> Option<bool> {
        use SystemValue::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => Some(a == b),
            (String(a), String(b)) => Some(a == b),
            (Integer(a), Integer(b)) => Some(a == b),
            (Integer(_) | Decimal(_), Integer(_) | Decimal(_)) => {
                let a = self.to_decimal(false).ok().flatten()?;
                let b = other.to_decimal(false).ok().flatten()?;
                Some(a == b)
            }
            (Date(_) | DateTime(_), Date(_) | DateTime(_)) => {
                let a = self.to_date_time(false).ok().flatten()?;
                let b = other.to_date_time(false).ok().flatten()?;
                a.partial_compare(&b).map(|o| o == Ordering::Equal)
            }
            (Time(a), Time(b)) => a.partial_compare(b).map(|o| o == Ordering::Equal),
            (Quantity(_), _) | (_, Quantity(_)) => {
                let a = self.to_quantity(false).ok().flatten()?;
                let b = other.to_quantity(false).ok().flatten()?;
                (a.unit == b.unit).then_some(a.value == b.value)
            }
            _ => None,
        }
    }

    /// FHIRPath `~`.
    ///
    /// Strings compare case-insensitively with whitespace normalized, decimals
    /// at the lesser of the two precisions, and temporal values only when both
    /// carry the same precision. Anything incomparable is not equivalent.
    pub fn equivalent(&self, other: &SystemValue) -> bool {
        use SystemValue::*;
        match (self, other) {
            (String(a), String(b)) => normalize_text(a) == normalize_text(b),
            (Decimal(_), Integer(_) | Decimal(_)) | (Integer(_), Decimal(_)) => {
                match (self.to_decimal(false), other.to_decimal(false)) {
                    (Ok(Some(a)), Ok(Some(b))) => decimals_equivalent(a, b),
                    _ => false,
                }
            }
            (Date(_) | DateTime(_), Date(_) | DateTime(_)) => {
                match (self.to_date_time(false), other.to_date_time(false)) {
                    (Ok(Some(a)), Ok(Some(b))) => {
                        a.same_precision(&b) && a.partial_compare(&b) == Some(Ordering::Equal)
                    }
                    _ => false,
                }
            }
            (Time(a), Time(b)) => {
                a.same_precision(b) && a.partial_compare(b) == Some(Ordering::Equal)
            }
            (Quantity(a), Quantity(b)) => {
                a.unit == b.unit && decimals_equivalent(a.value, b.value)
            }
            _ => self.equal(other) == Some(true),
        }
    }
}

fn decimals_equivalent(a: Decimal, b: Decimal) -> bool {
    let scale = a.scale().min(b.scale());
    a.round_dp(scale) == b.round_dp(scale)
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse_integer_literal(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parses a FHIRPath decimal literal: optional sign, digits, optional
/// fraction. Exponents are not part of the literal grammar.
pub fn parse_decimal_literal(text: &str) -> Option<Decimal> {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits_only = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || fraction.is_some_and(|f| !digits_only(f)) {
        return None;
    }
    Decimal::from_str(text.strip_prefix('+').unwrap_or(text)).ok()
}

impl fmt::Display for SystemValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemValue::Boolean(b) => write!(f, "{}", b),
            SystemValue::String(s) => write!(f, "{}", s),
            SystemValue::Integer(i) => write!(f, "{}", i),
            SystemValue::Decimal(d) => write!(f, "{}", d),
            SystemValue::Date(d) => write!(f, "{}", d),
            SystemValue::DateTime(dt) => write!(f, "{}", dt),
            SystemValue::Time(t) => write!(f, "{}", t),
            SystemValue::Quantity(q) => write!(f, "{}", q),
        }
    }
}
