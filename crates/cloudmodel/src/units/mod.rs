//! Dimensional quantities
//!
//! This module provides the unit vocabulary of the cloud model and the
//! quantity types built on it:
//! - [`Dimension`] algebra over time, currency, computation, storage and requests
//! - An immutable [`UnitRegistry`] mapping symbols to scales and dimensions
//! - [`Quantity`], an untyped magnitude/unit pair
//! - [`Measure`] and its aliases ([`Time`], [`CurrencyPerTime`], ...), which
//!   refuse to hold a value of the wrong dimension

mod dimension;
mod error;
mod expr;
mod measure;
mod quantity;
mod registry;

#[cfg(test)]
mod tests;

pub use dimension::{BaseDimension, Dimension, MAX_EXPONENT};
pub use error::{UnitError, UnitResult};
pub use expr::Unit;
pub use measure::{
    ComputationKind, ComputationalUnits, Currency, CurrencyKind, CurrencyPerTime,
    CurrencyRateKind, Kind, Measure, RequestRateKind, Requests, RequestsKind, RequestsPerTime,
    Storage, StorageKind, Time, TimeKind,
};
pub use quantity::{Quantity, DEFAULT_REL_TOLERANCE};
pub use registry::{standard_builder, RegisteredUnit, UnitDef, UnitRegistry, UnitRegistryBuilder};
