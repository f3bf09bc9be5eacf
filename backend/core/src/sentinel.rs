//! Sentinel encoding for undetermined fields.
//!
//! In memory an undetermined field is `None`. On the wire (JSON, the store)
//! it is the text `"unknown"`, or `0` for the amount. The serde adapters in
//! this module convert between the two so callers never compare strings
//! against the sentinel.

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};
use std::str::FromStr;

/// Wire sentinel for undetermined text fields.
pub const UNKNOWN: &str = "unknown";

/// Canonical day-month-year wire format for cheque dates.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Whether a free-text value is a placeholder rather than a real value.
///
/// Covers the sentinel itself plus the placeholders models and older
/// records tend to emit.
pub fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.is_empty()
        || ["unknown", "n/a", "na", "none", "null", "nil", "-", "?", "not found"]
            .iter()
            .any(|p| v.eq_ignore_ascii_case(p))
}

/// `Option<String>` <-> `"unknown"`.
pub mod text {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or(UNKNOWN))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|v| !is_placeholder(v)))
    }
}

/// `Option<NaiveDate>` <-> `"dd-mm-yyyy"` or `"unknown"`.
pub mod date {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => s.serialize_str(&date.format(DATE_FORMAT).to_string()),
            None => s.serialize_str(UNKNOWN),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw {
            Some(v) if !is_placeholder(&v) => NaiveDate::parse_from_str(v.trim(), DATE_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

/// `Option<Decimal>` <-> JSON number, `0` meaning undetermined.
pub mod amount {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
        match value.and_then(|d| d.to_f64()) {
            Some(v) => s.serialize_f64(v),
            None => s.serialize_u64(0),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
        let raw = Option::<NumberOrText>::deserialize(d)?;
        let parsed = match raw {
            None => None,
            Some(NumberOrText::Number(n)) => Decimal::from_f64(n).map(|d| d.round_dp(2)),
            Some(NumberOrText::Text(t)) => Decimal::from_str(t.trim().replace(',', "").as_str()).ok(),
        };
        Ok(parsed.filter(|d| !d.is_zero()))
    }
}
