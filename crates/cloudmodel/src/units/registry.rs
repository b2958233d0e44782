//! Unit registry
//!
//! The registry maps unit symbols (canonical names and aliases) to their
//! definition: a scale relative to the base unit of the dimension and the
//! dimension itself. A registry is immutable once built; the standard
//! vocabulary is built once per process and shared.

use super::dimension::{BaseDimension, Dimension};
use super::error::{UnitError, UnitResult};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Standard registry (initialized once)
static STANDARD: OnceLock<UnitRegistry> = OnceLock::new();

/// Definition of a single named unit
///
/// The scale is kept as `numerator / denominator` so that sub-units such as
/// the millicore (1/1000 core) convert without rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDef {
    name: String,
    numerator: f64,
    denominator: f64,
    dimension: Dimension,
}

impl UnitDef {
    /// A unit of scale one for the given dimension
    pub fn new(name: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            name: name.into(),
            numerator: 1.0,
            denominator: 1.0,
            dimension,
        }
    }

    /// Set the scale as `numerator / denominator` base units
    pub fn with_scale(mut self, numerator: f64, denominator: f64) -> Self {
        self.numerator = numerator;
        self.denominator = denominator;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn numerator(&self) -> f64 {
        self.numerator
    }

    pub fn denominator(&self) -> f64 {
        self.denominator
    }

    /// Size of this unit in base units
    pub fn scale(&self) -> f64 {
        self.numerator / self.denominator
    }

    fn is_base_of(&self, base: BaseDimension) -> bool {
        self.dimension == Dimension::base(base) && self.numerator == self.denominator
    }
}

/// A registered unit together with its alternative symbols
#[derive(Debug, Clone)]
pub struct RegisteredUnit {
    pub def: Arc<UnitDef>,
    pub aliases: Vec<String>,
}

/// Immutable symbol table of units
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: Vec<RegisteredUnit>,
    symbols: HashMap<String, usize>,
    base_units: HashMap<BaseDimension, usize>,
}

impl UnitRegistry {
    pub fn builder() -> UnitRegistryBuilder {
        UnitRegistryBuilder::default()
    }

    /// The process-wide registry with the cloud model vocabulary
    ///
    /// # Panics
    ///
    /// Never in practice: the only build error is a duplicate symbol, and
    /// the fixed vocabulary of [`standard_builder`] has none
    /// (`test_standard_vocabulary_has_unique_symbols`).
    pub fn standard() -> &'static UnitRegistry {
        STANDARD.get_or_init(|| {
            // fixed vocabulary, duplicate-free
            standard_builder()
                .build()
                .expect("Failed to build standard unit registry")
        })
    }

    /// Resolve a symbol to its definition
    pub fn lookup(&self, symbol: &str) -> UnitResult<Arc<UnitDef>> {
        self.symbols
            .get(symbol)
            .map(|idx| self.units[*idx].def.clone())
            .ok_or_else(|| UnitError::unrecognized(symbol))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// Scale-one unit registered for a base dimension
    pub fn base_unit(&self, base: BaseDimension) -> UnitResult<Arc<UnitDef>> {
        self.base_units
            .get(&base)
            .map(|idx| self.units[*idx].def.clone())
            .ok_or_else(|| UnitError::unrecognized(format!("[{}]", base.name())))
    }

    /// All registered units, in definition order
    pub fn units(&self) -> impl Iterator<Item = &RegisteredUnit> {
        self.units.iter()
    }

    /// Registered units of a given dimension
    pub fn units_of(&self, dimension: Dimension) -> impl Iterator<Item = &RegisteredUnit> {
        self.units
            .iter()
            .filter(move |u| u.def.dimension() == dimension)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Builder for [`UnitRegistry`]
///
/// The first error (a duplicated symbol) is kept and reported by
/// [`UnitRegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct UnitRegistryBuilder {
    units: Vec<RegisteredUnit>,
    symbols: HashMap<String, usize>,
    error: Option<UnitError>,
}

impl UnitRegistryBuilder {
    /// Register a unit under its canonical name and the given aliases
    pub fn define(mut self, def: UnitDef, aliases: &[&str]) -> Self {
        if self.error.is_some() {
            return self;
        }

        let idx = self.units.len();
        let symbols = std::iter::once(def.name()).chain(aliases.iter().copied());
        for symbol in symbols {
            if self.symbols.insert(symbol.to_string(), idx).is_some() {
                self.error = Some(UnitError::DuplicateUnit {
                    symbol: symbol.to_string(),
                });
                return self;
            }
        }

        self.units.push(RegisteredUnit {
            def: Arc::new(def),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> UnitResult<UnitRegistry> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut base_units = HashMap::new();
        for base in BaseDimension::ALL {
            if let Some(idx) = self.units.iter().position(|u| u.def.is_base_of(base)) {
                base_units.insert(base, idx);
            }
        }

        Ok(UnitRegistry {
            units: self.units,
            symbols: self.symbols,
            base_units,
        })
    }
}

/// Vocabulary of the cloud model: time, a single currency, CPU capacity,
/// storage, requests and the derived rates. Lengths are included so that
/// they are reported as dimension mismatches.
pub fn standard_builder() -> UnitRegistryBuilder {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = 60.0 * MINUTE;
    const DAY: f64 = 24.0 * HOUR;

    UnitRegistry::builder()
        // time
        .define(UnitDef::new("second", Dimension::TIME), &["s", "sec", "seconds"])
        .define(
            UnitDef::new("millisecond", Dimension::TIME).with_scale(1.0, 1e3),
            &["ms", "milliseconds"],
        )
        .define(
            UnitDef::new("microsecond", Dimension::TIME).with_scale(1.0, 1e6),
            &["us", "µs", "microseconds"],
        )
        .define(
            UnitDef::new("nanosecond", Dimension::TIME).with_scale(1.0, 1e9),
            &["ns", "nanoseconds"],
        )
        .define(
            UnitDef::new("minute", Dimension::TIME).with_scale(MINUTE, 1.0),
            &["min", "minutes"],
        )
        .define(
            UnitDef::new("hour", Dimension::TIME).with_scale(HOUR, 1.0),
            &["h", "hr", "hours"],
        )
        .define(
            UnitDef::new("day", Dimension::TIME).with_scale(DAY, 1.0),
            &["d", "days"],
        )
        .define(
            UnitDef::new("week", Dimension::TIME).with_scale(7.0 * DAY, 1.0),
            &["weeks"],
        )
        .define(
            UnitDef::new("year", Dimension::TIME).with_scale(365.25 * DAY, 1.0),
            &["y", "yr", "years"],
        )
        // currency
        .define(UnitDef::new("usd", Dimension::CURRENCY), &[])
        // computation
        .define(UnitDef::new("core", Dimension::COMPUTATION), &["cores"])
        .define(
            UnitDef::new("vcore", Dimension::COMPUTATION).with_scale(1.0, 2.0),
            &["vcores"],
        )
        .define(
            UnitDef::new("millicore", Dimension::COMPUTATION).with_scale(1.0, 1e3),
            &["millicores"],
        )
        // storage
        .define(UnitDef::new("byte", Dimension::STORAGE), &["B", "bytes"])
        .define(
            UnitDef::new("bit", Dimension::STORAGE).with_scale(1.0, 8.0),
            &["bits"],
        )
        .define(
            UnitDef::new("kilobyte", Dimension::STORAGE).with_scale(1e3, 1.0),
            &["kB"],
        )
        .define(
            UnitDef::new("megabyte", Dimension::STORAGE).with_scale(1e6, 1.0),
            &["MB"],
        )
        .define(
            UnitDef::new("gigabyte", Dimension::STORAGE).with_scale(1e9, 1.0),
            &["GB"],
        )
        .define(
            UnitDef::new("terabyte", Dimension::STORAGE).with_scale(1e12, 1.0),
            &["TB"],
        )
        .define(
            UnitDef::new("kibibyte", Dimension::STORAGE).with_scale(1024.0, 1.0),
            &["KiB"],
        )
        .define(
            UnitDef::new("mebibyte", Dimension::STORAGE).with_scale(1024.0 * 1024.0, 1.0),
            &["MiB"],
        )
        .define(
            UnitDef::new("gibibyte", Dimension::STORAGE)
                .with_scale(1024.0 * 1024.0 * 1024.0, 1.0),
            &["GiB"],
        )
        .define(
            UnitDef::new("tebibyte", Dimension::STORAGE)
                .with_scale(1024.0 * 1024.0 * 1024.0 * 1024.0, 1.0),
            &["TiB"],
        )
        // requests
        .define(UnitDef::new("req", Dimension::REQUESTS), &["request", "requests"])
        .define(UnitDef::new("rps", Dimension::REQUEST_RATE), &[])
        .define(
            UnitDef::new("rpm", Dimension::REQUEST_RATE).with_scale(1.0, MINUTE),
            &[],
        )
        .define(
            UnitDef::new("rph", Dimension::REQUEST_RATE).with_scale(1.0, HOUR),
            &[],
        )
        // length
        .define(UnitDef::new("meter", Dimension::LENGTH), &["m", "meters", "metre"])
        .define(
            UnitDef::new("centimeter", Dimension::LENGTH).with_scale(1.0, 100.0),
            &["cm"],
        )
        .define(
            UnitDef::new("millimeter", Dimension::LENGTH).with_scale(1.0, 1e3),
            &["mm"],
        )
        .define(
            UnitDef::new("kilometer", Dimension::LENGTH).with_scale(1e3, 1.0),
            &["km"],
        )
        .define(
            UnitDef::new("liter", Dimension::LENGTH.powi(3)).with_scale(1.0, 1e3),
            &["l", "L", "litre", "liters"],
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_builds() {
        let registry = UnitRegistry::standard();
        assert!(!registry.is_empty());
        assert!(registry.contains("hour"));
        assert!(registry.contains("h"));
        assert!(registry.contains("millicores"));
        assert!(!registry.contains("eur"));
    }

    #[test]
    fn test_standard_vocabulary_has_unique_symbols() {
        let registry = standard_builder().build().unwrap();
        for unit in registry.units() {
            let def = registry.lookup(unit.def.name()).unwrap();
            assert!(Arc::ptr_eq(&def, &unit.def), "{}", unit.def.name());
            for alias in &unit.aliases {
                let def = registry.lookup(alias).unwrap();
                assert!(Arc::ptr_eq(&def, &unit.def), "{} -> {}", alias, unit.def.name());
            }
        }
    }

    #[test]
    fn test_lookup_aliases_share_definition() {
        let registry = UnitRegistry::standard();
        let hour = registry.lookup("hour").unwrap();
        let h = registry.lookup("h").unwrap();
        assert!(Arc::ptr_eq(&hour, &h));
        assert_eq!(hour.scale(), 3600.0);
        assert_eq!(hour.dimension(), Dimension::TIME);
    }

    #[test]
    fn test_unknown_symbol() {
        let err = UnitRegistry::standard().lookup("eur").unwrap_err();
        assert!(err.is_unrecognized_unit());
    }

    #[test]
    fn test_base_units() {
        let registry = UnitRegistry::standard();
        assert_eq!(registry.base_unit(BaseDimension::Time).unwrap().name(), "second");
        assert_eq!(registry.base_unit(BaseDimension::Currency).unwrap().name(), "usd");
        assert_eq!(registry.base_unit(BaseDimension::Requests).unwrap().name(), "req");
        assert_eq!(
            registry.base_unit(BaseDimension::Computation).unwrap().name(),
            "core"
        );
    }

    #[test]
    fn test_duplicate_symbol_rejected() {
        let result = UnitRegistry::builder()
            .define(UnitDef::new("second", Dimension::TIME), &["s"])
            .define(UnitDef::new("siemens", Dimension::DIMENSIONLESS), &["s"])
            .build();
        assert_eq!(
            result.unwrap_err(),
            UnitError::DuplicateUnit {
                symbol: "s".to_string()
            }
        );
    }

    #[test]
    fn test_custom_registry_is_independent() {
        let registry = UnitRegistry::builder()
            .define(UnitDef::new("eur", Dimension::CURRENCY), &[])
            .build()
            .unwrap();
        assert!(registry.contains("eur"));
        assert!(!UnitRegistry::standard().contains("eur"));
        assert!(registry.base_unit(BaseDimension::Time).is_err());
    }

    #[test]
    fn test_units_of_dimension() {
        let names: Vec<_> = UnitRegistry::standard()
            .units_of(Dimension::COMPUTATION)
            .map(|u| u.def.name().to_string())
            .collect();
        assert_eq!(names, vec!["core", "vcore", "millicore"]);
    }
}
