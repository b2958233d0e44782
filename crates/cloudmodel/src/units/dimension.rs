//! Physical dimensions and their algebra
//!
//! A [`Dimension`] is a vector of integer exponents over the
//! [`BaseDimension`]s of the cloud model. Derived dimensions such as a
//! request rate are built by multiplying and dividing base dimensions.

use std::fmt;
use std::ops::{Div, Mul};

/// Number of base dimensions tracked by [`Dimension`]
const BASE_COUNT: usize = 6;

/// Largest exponent magnitude of a dimension or unit factor.
///
/// The range is symmetric so every exponent can be negated.
pub const MAX_EXPONENT: i8 = i8::MAX;

/// Narrow a composed exponent back to `i8`, `None` outside `-MAX_EXPONENT..=MAX_EXPONENT`
pub(crate) const fn narrow_exponent(value: i32) -> Option<i8> {
    if value < -(MAX_EXPONENT as i32) || value > MAX_EXPONENT as i32 {
        None
    } else {
        Some(value as i8)
    }
}

/// Base dimensions known to the cloud model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseDimension {
    Time,
    Currency,
    /// CPU capacity
    Computation,
    Storage,
    Requests,
    /// Only present so that lengths and volumes are recognized as the
    /// wrong dimension instead of unknown symbols
    Length,
}

impl BaseDimension {
    pub const ALL: [BaseDimension; BASE_COUNT] = [
        BaseDimension::Time,
        BaseDimension::Currency,
        BaseDimension::Computation,
        BaseDimension::Storage,
        BaseDimension::Requests,
        BaseDimension::Length,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BaseDimension::Time => "time",
            BaseDimension::Currency => "currency",
            BaseDimension::Computation => "computation",
            BaseDimension::Storage => "storage",
            BaseDimension::Requests => "requests",
            BaseDimension::Length => "length",
        }
    }
}

impl fmt::Display for BaseDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name())
    }
}

/// Exponents over the base dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dimension {
    exponents: [i8; BASE_COUNT],
}

impl Dimension {
    pub const DIMENSIONLESS: Dimension = Dimension {
        exponents: [0; BASE_COUNT],
    };
    pub const TIME: Dimension = Dimension::base(BaseDimension::Time);
    pub const CURRENCY: Dimension = Dimension::base(BaseDimension::Currency);
    pub const COMPUTATION: Dimension = Dimension::base(BaseDimension::Computation);
    pub const STORAGE: Dimension = Dimension::base(BaseDimension::Storage);
    pub const REQUESTS: Dimension = Dimension::base(BaseDimension::Requests);
    pub const LENGTH: Dimension = Dimension::base(BaseDimension::Length);
    /// Requests per unit of time
    pub const REQUEST_RATE: Dimension = Dimension::REQUESTS.divide(Dimension::TIME);
    /// Currency per unit of time (prices)
    pub const CURRENCY_RATE: Dimension = Dimension::CURRENCY.divide(Dimension::TIME);

    /// Dimension made of a single base dimension with exponent one
    pub const fn base(base: BaseDimension) -> Self {
        let mut exponents = [0; BASE_COUNT];
        exponents[base as usize] = 1;
        Self { exponents }
    }

    /// Product of two dimensions.
    ///
    /// # Panics
    ///
    /// Panics if an exponent leaves `-MAX_EXPONENT..=MAX_EXPONENT`; use
    /// [`Dimension::checked_multiply`] for dimensions built from input.
    pub const fn multiply(self, other: Dimension) -> Self {
        match self.checked_multiply(other) {
            Some(dimension) => dimension,
            None => panic!("dimension exponent out of range"),
        }
    }

    /// # Panics
    ///
    /// Panics if an exponent leaves `-MAX_EXPONENT..=MAX_EXPONENT`.
    pub const fn divide(self, other: Dimension) -> Self {
        match self.checked_divide(other) {
            Some(dimension) => dimension,
            None => panic!("dimension exponent out of range"),
        }
    }

    /// # Panics
    ///
    /// Panics if an exponent leaves `-MAX_EXPONENT..=MAX_EXPONENT`.
    pub const fn powi(self, power: i8) -> Self {
        match self.checked_powi(power) {
            Some(dimension) => dimension,
            None => panic!("dimension exponent out of range"),
        }
    }

    /// Product of two dimensions, `None` if an exponent goes out of range
    pub const fn checked_multiply(self, other: Dimension) -> Option<Self> {
        let mut exponents = self.exponents;
        let mut i = 0;
        while i < BASE_COUNT {
            match narrow_exponent(exponents[i] as i32 + other.exponents[i] as i32) {
                Some(exponent) => exponents[i] = exponent,
                None => return None,
            }
            i += 1;
        }
        Some(Self { exponents })
    }

    pub const fn checked_divide(self, other: Dimension) -> Option<Self> {
        let mut exponents = self.exponents;
        let mut i = 0;
        while i < BASE_COUNT {
            match narrow_exponent(exponents[i] as i32 - other.exponents[i] as i32) {
                Some(exponent) => exponents[i] = exponent,
                None => return None,
            }
            i += 1;
        }
        Some(Self { exponents })
    }

    pub const fn checked_powi(self, power: i8) -> Option<Self> {
        let mut exponents = self.exponents;
        let mut i = 0;
        while i < BASE_COUNT {
            match narrow_exponent(exponents[i] as i32 * power as i32) {
                Some(exponent) => exponents[i] = exponent,
                None => return None,
            }
            i += 1;
        }
        Some(Self { exponents })
    }

    /// Exponent of a base dimension
    pub fn exponent(&self, base: BaseDimension) -> i8 {
        self.exponents[base as usize]
    }

    pub fn is_dimensionless(&self) -> bool {
        self.exponents.iter().all(|e| *e == 0)
    }

    /// Returns the base dimension if this dimension is exactly one of them
    pub fn as_base(&self) -> Option<BaseDimension> {
        BaseDimension::ALL
            .into_iter()
            .find(|b| *self == Dimension::base(*b))
    }
}

impl Mul for Dimension {
    type Output = Dimension;

    fn mul(self, rhs: Dimension) -> Dimension {
        self.multiply(rhs)
    }
}

impl Div for Dimension {
    type Output = Dimension;

    fn div(self, rhs: Dimension) -> Dimension {
        self.divide(rhs)
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, base: BaseDimension, exponent: i8) -> fmt::Result {
    if exponent == 1 {
        write!(f, "{}", base)
    } else {
        write!(f, "{} ** {}", base, exponent)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "[]");
        }

        let numerator: Vec<_> = BaseDimension::ALL
            .into_iter()
            .filter(|b| self.exponent(*b) > 0)
            .collect();
        let denominator: Vec<_> = BaseDimension::ALL
            .into_iter()
            .filter(|b| self.exponent(*b) < 0)
            .collect();

        if numerator.is_empty() {
            write!(f, "1")?;
        }
        for (i, base) in numerator.iter().enumerate() {
            if i > 0 {
                write!(f, " * ")?;
            }
            write_term(f, *base, self.exponent(*base))?;
        }
        for base in denominator {
            write!(f, " / ")?;
            write_term(f, base, -self.exponent(base))?;
        }
        Ok(())
    }
}
