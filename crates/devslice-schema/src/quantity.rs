//! Resource quantities such as `1Gi`, `500m` or `1.5e3`.
//!
//! Documents keep the raw text; parsing happens on demand so that a malformed
//! quantity surfaces as a field error instead of failing the whole document.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

const NANO_EXPONENT: i32 = 9;

pub const QUANTITY_FORMAT_MESSAGE: &str =
    "quantities must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,
    #[error("invalid number in quantity '{0}'")]
    InvalidNumber(String),
    #[error("unknown suffix '{suffix}' in quantity '{raw}'")]
    UnknownSuffix { raw: String, suffix: String },
    #[error("quantity '{0}' is out of range")]
    OutOfRange(String),
}

/// Unparsed quantity text, kept verbatim for round-tripping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(String);

impl Quantity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Result<ParsedQuantity, QuantityError> {
        parse_quantity(&self.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Int(i) => Self(i.to_string()),
            Raw::Float(f) => Self(f.to_string()),
        })
    }
}

/// A quantity normalized to nano-units. Sub-nano fractions round up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedQuantity {
    nanos: i128,
}

impl ParsedQuantity {
    pub fn nanos(self) -> i128 {
        self.nanos
    }

    pub fn is_negative(self) -> bool {
        self.nanos < 0
    }
}

enum Multiplier {
    Binary(u32),
    Decimal(i32),
}

fn suffix_multiplier(suffix: &str) -> Option<Multiplier> {
    let m = match suffix {
        "" => Multiplier::Decimal(0),
        "Ki" => Multiplier::Binary(1),
        "Mi" => Multiplier::Binary(2),
        "Gi" => Multiplier::Binary(3),
        "Ti" => Multiplier::Binary(4),
        "Pi" => Multiplier::Binary(5),
        "Ei" => Multiplier::Binary(6),
        "n" => Multiplier::Decimal(-9),
        "u" => Multiplier::Decimal(-6),
        "m" => Multiplier::Decimal(-3),
        "k" => Multiplier::Decimal(3),
        "M" => Multiplier::Decimal(6),
        "G" => Multiplier::Decimal(9),
        "T" => Multiplier::Decimal(12),
        "P" => Multiplier::Decimal(15),
        "E" => Multiplier::Decimal(18),
        _ => {
            let exp = suffix.strip_prefix(['e', 'E'])?;
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            Multiplier::Decimal(exp.parse().ok()?)
        }
    };
    Some(m)
}

pub fn parse_quantity(raw: &str) -> Result<ParsedQuantity, QuantityError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(QuantityError::Empty);
    }

    let (negative, unsigned) = match text.as_bytes()[0] {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let number_end = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_end);

    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if (int_part.is_empty() && frac_part.is_empty()) || frac_part.contains('.') {
        return Err(QuantityError::InvalidNumber(raw.to_owned()));
    }

    let multiplier = suffix_multiplier(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
        raw: raw.to_owned(),
        suffix: suffix.to_owned(),
    })?;

    let out_of_range = || QuantityError::OutOfRange(raw.to_owned());

    let mut mantissa: i128 = 0;
    for b in int_part.bytes().chain(frac_part.bytes()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(i128::from(b - b'0')))
            .ok_or_else(out_of_range)?;
    }

    let frac_len = i32::try_from(frac_part.len()).map_err(|_| out_of_range())?;
    let (binary_power, decimal_exp) = match multiplier {
        Multiplier::Binary(power) => (power, 0),
        Multiplier::Decimal(exp) => (0, exp),
    };

    mantissa = mantissa
        .checked_mul(1024i128.checked_pow(binary_power).ok_or_else(out_of_range)?)
        .ok_or_else(out_of_range)?;

    let ten_power = decimal_exp
        .checked_add(NANO_EXPONENT)
        .and_then(|p| p.checked_sub(frac_len))
        .ok_or_else(out_of_range)?;

    let magnitude = if ten_power >= 0 {
        let scale = 10i128
            .checked_pow(ten_power.unsigned_abs())
            .ok_or_else(out_of_range)?;
        if mantissa == 0 {
            0
        } else {
            mantissa.checked_mul(scale).ok_or_else(out_of_range)?
        }
    } else {
        match 10i128.checked_pow(ten_power.unsigned_abs()) {
            Some(scale) => ceil_div(mantissa, scale),
            // Smaller than one nano-unit.
            None => i128::from(mantissa != 0),
        }
    };

    Ok(ParsedQuantity {
        nanos: if negative { -magnitude } else { magnitude },
    })
}

fn ceil_div(value: i128, divisor: i128) -> i128 {
    let q = value / divisor;
    if value % divisor == 0 {
        q
    } else {
        q + 1
    }
}
