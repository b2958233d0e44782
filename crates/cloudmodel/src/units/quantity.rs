//! Untyped quantities: a magnitude paired with a unit expression

use super::dimension::Dimension;
use super::error::{UnitError, UnitResult};
use super::expr::Unit;
use super::registry::UnitRegistry;
use std::fmt;
use std::str::FromStr;

/// Default relative tolerance for [`Quantity::approx_eq`]
pub const DEFAULT_REL_TOLERANCE: f64 = 1e-9;

/// Immutable (magnitude, unit) pair
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    magnitude: f64,
    unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Parse `"<number> <unit>"` against the standard registry
    pub fn parse(input: &str) -> UnitResult<Self> {
        Self::parse_in(UnitRegistry::standard(), input)
    }

    /// Parse `"<number> <unit>"`.
    ///
    /// The separating space is optional (`1h`, `10ms`). A bare unit means a
    /// magnitude of one and a bare number is dimensionless.
    pub fn parse_in(registry: &UnitRegistry, input: &str) -> UnitResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(UnitError::malformed(input, "empty quantity"));
        }

        let (magnitude, unit_expr) = split_magnitude(trimmed);
        let unit = Unit::parse_in(registry, unit_expr).map_err(|err| match err {
            UnitError::MalformedQuantity { reason, .. } => UnitError::malformed(input, reason),
            other => other,
        })?;

        Ok(Self {
            magnitude: magnitude.unwrap_or(1.0),
            unit,
        })
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }

    /// Convert to a unit given as an expression (`"req / minute"`)
    pub fn to(&self, unit: &str) -> UnitResult<Quantity> {
        self.to_in(UnitRegistry::standard(), unit)
    }

    /// Convert to a unit expression resolved against `registry`
    pub fn to_in(&self, registry: &UnitRegistry, unit: &str) -> UnitResult<Quantity> {
        self.to_unit(&Unit::parse_in(registry, unit)?)
    }

    pub fn to_unit(&self, unit: &Unit) -> UnitResult<Quantity> {
        let magnitude = self
            .unit
            .convert_magnitude(self.magnitude, unit)
            .map_err(|_| UnitError::mismatch(self, unit.dimension(), self.dimension()))?;
        Ok(Quantity {
            magnitude,
            unit: unit.clone(),
        })
    }

    /// Product of two quantities; fails if a unit exponent goes out of range
    pub fn multiply(&self, rhs: &Quantity) -> UnitResult<Quantity> {
        Ok(Quantity {
            magnitude: self.magnitude * rhs.magnitude,
            unit: self.unit.multiply(&rhs.unit)?,
        })
    }

    pub fn divide(&self, rhs: &Quantity) -> UnitResult<Quantity> {
        Ok(Quantity {
            magnitude: self.magnitude / rhs.magnitude,
            unit: self.unit.per(&rhs.unit)?,
        })
    }

    /// Same unit, magnitude multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> Quantity {
        Quantity {
            magnitude: self.magnitude * factor,
            unit: self.unit.clone(),
        }
    }

    /// Same unit, new magnitude
    pub fn with_magnitude(&self, magnitude: f64) -> Quantity {
        Quantity {
            magnitude,
            unit: self.unit.clone(),
        }
    }

    /// Tolerance-based equality after expressing `other` in this unit.
    /// Quantities of different dimensions are never equal.
    pub fn approx_eq(&self, other: &Quantity, rel_tol: f64) -> bool {
        match other.unit.convert_magnitude(other.magnitude, &self.unit) {
            Ok(theirs) => close(self.magnitude, theirs, rel_tol),
            Err(_) => false,
        }
    }
}

/// Relative closeness; exact equality covers zeros and infinities
pub(crate) fn close(a: f64, b: f64, rel_tol: f64) -> bool {
    a == b || (a - b).abs() <= rel_tol * a.abs().max(b.abs())
}

/// Split the leading number off a quantity string.
///
/// The first whitespace-separated token is tried as a whole (this accepts
/// `inf`, `nan` and exponents such as `1e+30`); otherwise the longest
/// numeric prefix is taken so that `1h` and `10ms` parse.
fn split_magnitude(input: &str) -> (Option<f64>, &str) {
    let token_end = input.find(char::is_whitespace).unwrap_or(input.len());
    if let Ok(value) = input[..token_end].parse::<f64>() {
        return (Some(value), &input[token_end..]);
    }

    let bytes = input.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    if !bytes[digits_start..end].iter().any(u8::is_ascii_digit) {
        return (None, input);
    }

    // exponent only when followed by digits, so "2eur" keeps its unit
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        if exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            end = exp_end;
        }
    }

    match input[..end].parse::<f64>() {
        Ok(value) => (Some(value), &input[end..]),
        Err(_) => (None, input),
    }
}

impl FromStr for Quantity {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_dimensionless() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}
