//! Cloud capacity planning model
//!
//! This crate provides:
//! - Dimension-checked quantities (time, currency, computation, storage,
//!   requests and their rates) backed by an immutable unit registry
//! - The problem description handed to an allocation optimizer
//! - Time-unit normalization of whole problems
//! - JSON / YAML problem documents

pub mod document;
pub mod error;
pub mod model;
pub mod normalize;
pub mod units;

pub use document::{load_problem, save_problem, DocumentFormat, ProblemDocument};
pub use error::{ModelError, ModelResult};
pub use model::*;
pub use normalize::{normalize_time_units, normalize_time_units_in, scale_workload_series};
pub use units::{
    ComputationalUnits, Currency, CurrencyPerTime, Dimension, Quantity, Requests, RequestsPerTime,
    Storage, Time, Unit, UnitError, UnitRegistry, UnitResult,
};
