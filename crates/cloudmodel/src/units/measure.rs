//! Dimension-checked quantity types
//!
//! [`Measure<K>`] wraps a [`Quantity`] whose dimension is guaranteed to be
//! `K::DIMENSION`. The check happens once, in the constructors; every
//! consumer of a `Time`, `CurrencyPerTime`, ... can rely on it afterwards.

use super::dimension::Dimension;
use super::error::{UnitError, UnitResult};
use super::expr::Unit;
use super::quantity::Quantity;
use super::registry::UnitRegistry;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

/// Marker for the dimension a [`Measure`] must carry
pub trait Kind: 'static {
    const DIMENSION: Dimension;
    const NAME: &'static str;
}

macro_rules! quantity_kinds {
    ($($(#[$meta:meta])* $kind:ident => $alias:ident: $dimension:expr;)*) => {
        $(
            #[derive(Debug)]
            pub enum $kind {}

            impl Kind for $kind {
                const DIMENSION: Dimension = $dimension;
                const NAME: &'static str = stringify!($alias);
            }

            $(#[$meta])*
            pub type $alias = Measure<$kind>;
        )*
    };
}

quantity_kinds! {
    /// A duration
    TimeKind => Time: Dimension::TIME;
    /// An amount of money
    CurrencyKind => Currency: Dimension::CURRENCY;
    /// A price rate such as `0.5 usd/hour`
    CurrencyRateKind => CurrencyPerTime: Dimension::CURRENCY_RATE;
    /// CPU capacity (`cores`, `millicores`)
    ComputationKind => ComputationalUnits: Dimension::COMPUTATION;
    /// Memory or disk size
    StorageKind => Storage: Dimension::STORAGE;
    /// A request count
    RequestsKind => Requests: Dimension::REQUESTS;
    /// A request rate such as `20 req/s`
    RequestRateKind => RequestsPerTime: Dimension::REQUEST_RATE;
}

/// A quantity whose dimension is fixed by `K`
pub struct Measure<K: Kind> {
    quantity: Quantity,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Kind> Measure<K> {
    /// Build from a magnitude and a unit expression
    pub fn new(magnitude: f64, unit: &str) -> UnitResult<Self> {
        Self::try_from(Quantity::new(magnitude, Unit::parse(unit)?))
    }

    /// Parse `"<number> <unit>"` against the standard registry
    pub fn parse(input: &str) -> UnitResult<Self> {
        Self::try_from(Quantity::parse(input)?)
    }

    pub fn parse_in(registry: &UnitRegistry, input: &str) -> UnitResult<Self> {
        Self::try_from(Quantity::parse_in(registry, input)?)
    }

    /// The dimension every value of this type carries
    pub fn dimension() -> Dimension {
        K::DIMENSION
    }

    /// Wrap a quantity whose dimension is already known to match
    fn checked(quantity: Quantity) -> Self {
        debug_assert_eq!(quantity.dimension(), K::DIMENSION);
        Self {
            quantity,
            _kind: PhantomData,
        }
    }

    pub fn magnitude(&self) -> f64 {
        self.quantity.magnitude()
    }

    pub fn unit(&self) -> &Unit {
        self.quantity.unit()
    }

    pub fn quantity(&self) -> &Quantity {
        &self.quantity
    }

    pub fn into_quantity(self) -> Quantity {
        self.quantity
    }

    /// Re-express in another unit of the same dimension
    pub fn to(&self, unit: &str) -> UnitResult<Self> {
        self.to_in(UnitRegistry::standard(), unit)
    }

    /// Re-express in a unit resolved against `registry`, for values parsed
    /// with [`Measure::parse_in`]
    pub fn to_in(&self, registry: &UnitRegistry, unit: &str) -> UnitResult<Self> {
        self.to_unit(&Unit::parse_in(registry, unit)?)
    }

    pub fn to_unit(&self, unit: &Unit) -> UnitResult<Self> {
        if unit.dimension() != K::DIMENSION {
            return Err(UnitError::mismatch(unit, K::DIMENSION, unit.dimension()));
        }
        Ok(Self::checked(self.quantity.to_unit(unit)?))
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::checked(self.quantity.scaled(factor))
    }

    pub fn with_magnitude(&self, magnitude: f64) -> Self {
        Self::checked(self.quantity.with_magnitude(magnitude))
    }

    pub fn approx_eq(&self, other: &Self, rel_tol: f64) -> bool {
        self.quantity.approx_eq(&other.quantity, rel_tol)
    }
}

impl CurrencyPerTime {
    /// Money spent at this rate over `duration`
    pub fn cost_over(&self, duration: &Time) -> UnitResult<Currency> {
        self.quantity.multiply(&duration.quantity).map(Currency::checked)
    }
}

impl RequestsPerTime {
    /// Requests served at this rate over `duration`
    pub fn requests_over(&self, duration: &Time) -> UnitResult<Requests> {
        self.quantity.multiply(&duration.quantity).map(Requests::checked)
    }
}

impl<K: Kind> TryFrom<Quantity> for Measure<K> {
    type Error = UnitError;

    fn try_from(quantity: Quantity) -> Result<Self, Self::Error> {
        if quantity.dimension() != K::DIMENSION {
            return Err(UnitError::mismatch(
                &quantity,
                K::DIMENSION,
                quantity.dimension(),
            ));
        }
        Ok(Self::checked(quantity))
    }
}

impl<K: Kind> From<Measure<K>> for Quantity {
    fn from(measure: Measure<K>) -> Quantity {
        measure.quantity
    }
}

impl<K: Kind> Clone for Measure<K> {
    fn clone(&self) -> Self {
        Self::checked(self.quantity.clone())
    }
}

impl<K: Kind> PartialEq for Measure<K> {
    fn eq(&self, other: &Self) -> bool {
        self.quantity == other.quantity
    }
}

impl<K: Kind> fmt::Debug for Measure<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", K::NAME, self.quantity)
    }
}

impl<K: Kind> fmt::Display for Measure<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.quantity, f)
    }
}

impl<K: Kind> FromStr for Measure<K> {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<K: Kind> Serialize for Measure<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.quantity)
    }
}

impl<'de, K: Kind> Deserialize<'de> for Measure<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}
