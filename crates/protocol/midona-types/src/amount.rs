//! Monetary amounts.
//!
//! On the wire every amount is an integer string in minor units together
//! with an asset code and an asset scale. Donation amounts arrive from
//! callers in major units and are converted exactly once, by
//! [`MajorAmount::to_minor_units`], using decimal arithmetic on the digits
//! rather than floating point.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::MAX_MAJOR_INTEGER_DIGITS;
use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// Wire Amount
// =============================================================================

/// An amount as Open Payments transmits it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    /// Integer string in minor units.
    pub value: String,
    /// Asset code (e.g. "USD").
    pub asset_code: String,
    /// Number of decimal places of the minor unit.
    pub asset_scale: u8,
}

impl Amount {
    /// Create an amount from minor units.
    pub fn new(minor_units: u64, asset_code: impl Into<String>, asset_scale: u8) -> Self {
        Self {
            value: minor_units.to_string(),
            asset_code: asset_code.into(),
            asset_scale,
        }
    }

    /// Parse the value as minor units.
    ///
    /// Rejects anything that is not a plain non-negative integer string.
    pub fn minor_units(&self) -> ValidationResult<u64> {
        if self.value.is_empty() || !self.value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::invalid_amount(format!(
                "'{}' is not an integer minor-unit value",
                self.value
            )));
        }
        self.value
            .parse::<u64>()
            .map_err(|_| ValidationError::AmountOverflow)
    }
}

impl fmt::Display for Amount {
    /// Renders in major units, e.g. `12.35 USD`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = self.asset_scale as usize;
        if scale == 0 || !self.value.bytes().all(|b| b.is_ascii_digit()) {
            return write!(f, "{} {}", self.value, self.asset_code);
        }
        let padded = format!("{:0>width$}", self.value, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}.{} {}", int_part, frac_part, self.asset_code)
    }
}

// =============================================================================
// Major-unit Amount
// =============================================================================

/// A caller-supplied decimal amount in major currency units.
///
/// Holds the validated decimal text so that conversion never goes through
/// binary floating point. Deserializes from a JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MajorAmount(String);

impl MajorAmount {
    /// Parse and validate a decimal string such as `"12.345"`.
    pub fn parse(input: &str) -> ValidationResult<Self> {
        let text = input.trim();
        if text.is_empty() {
            return Err(ValidationError::invalid_amount("empty amount"));
        }
        if text.starts_with('-') {
            return Err(ValidationError::NegativeAmount);
        }
        let text = text.strip_prefix('+').unwrap_or(text);

        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, f),
            None => (text, ""),
        };
        let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !digits_only(int_part) || !digits_only(frac_part) {
            return Err(ValidationError::invalid_amount(format!(
                "'{}' is not a decimal number",
                input.trim()
            )));
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ValidationError::invalid_amount(format!(
                "'{}' has no digits",
                input.trim()
            )));
        }
        if int_part.trim_start_matches('0').len() > MAX_MAJOR_INTEGER_DIGITS {
            return Err(ValidationError::AmountOverflow);
        }

        Ok(Self(text.to_string()))
    }

    /// The validated decimal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to integer minor units at `scale` decimal places.
    ///
    /// Rounds half up on the first dropped digit: at scale 2, `12.345`
    /// becomes `1235`, `0.005` becomes `1` and `0.004` becomes `0`.
    pub fn to_minor_units(&self, scale: u8) -> ValidationResult<u64> {
        let (int_part, frac_part) = match self.0.split_once('.') {
            Some((i, f)) => (i, f),
            None => (self.0.as_str(), ""),
        };
        let scale = scale as usize;

        let int_value: u64 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| ValidationError::AmountOverflow)?
        };

        let frac = frac_part.as_bytes();
        let mut kept: u64 = 0;
        for i in 0..scale {
            let digit = frac.get(i).map(|b| (b - b'0') as u64).unwrap_or(0);
            kept = kept
                .checked_mul(10)
                .and_then(|k| k.checked_add(digit))
                .ok_or(ValidationError::AmountOverflow)?;
        }
        let round_up = frac.get(scale).is_some_and(|b| *b >= b'5');

        let factor = 10u64
            .checked_pow(scale as u32)
            .ok_or(ValidationError::AmountOverflow)?;
        int_value
            .checked_mul(factor)
            .and_then(|v| v.checked_add(kept))
            .and_then(|v| v.checked_add(round_up as u64))
            .ok_or(ValidationError::AmountOverflow)
    }
}

impl FromStr for MajorAmount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MajorAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MajorAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MajorAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MajorAmountVisitor)
    }
}

struct MajorAmountVisitor;

impl<'de> Visitor<'de> for MajorAmountVisitor {
    type Value = MajorAmount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        MajorAmount::parse(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        MajorAmount::parse(&v.to_string()).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        MajorAmount::parse(&v.to_string()).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        // `Display` for f64 prints the shortest round-tripping decimal
        // without exponent notation.
        MajorAmount::parse(&v.to_string()).map_err(E::custom)
    }
}
