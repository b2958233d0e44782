//! Errors raised while building or converting quantities

use super::dimension::Dimension;
use thiserror::Error;

pub type UnitResult<T> = Result<T, UnitError>;

/// Dimensional errors. All of them surface at the point of construction
/// or conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// The symbol is not part of the unit registry
    #[error("unrecognized unit '{symbol}'")]
    UnrecognizedUnit { symbol: String },

    /// The unit exists but has the wrong physical dimension
    #[error("cannot use '{value}' as {expected}: its dimension is {found}")]
    DimensionalityMismatch {
        value: String,
        expected: Dimension,
        found: Dimension,
    },

    #[error("malformed quantity '{input}': {reason}")]
    MalformedQuantity { input: String, reason: String },

    /// The symbol was registered twice while building a registry
    #[error("unit symbol '{symbol}' is already defined")]
    DuplicateUnit { symbol: String },
}

impl UnitError {
    pub(crate) fn unrecognized(symbol: impl Into<String>) -> Self {
        UnitError::UnrecognizedUnit {
            symbol: symbol.into(),
        }
    }

    pub(crate) fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        UnitError::MalformedQuantity {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(value: impl ToString, expected: Dimension, found: Dimension) -> Self {
        UnitError::DimensionalityMismatch {
            value: value.to_string(),
            expected,
            found,
        }
    }

    pub fn is_dimensionality_mismatch(&self) -> bool {
        matches!(self, UnitError::DimensionalityMismatch { .. })
    }

    pub fn is_unrecognized_unit(&self) -> bool {
        matches!(self, UnitError::UnrecognizedUnit { .. })
    }
}
