//! Unit expressions
//!
//! A [`Unit`] is a product of registered units raised to integer powers,
//! e.g. `usd / hour` or `req/s`. Parsing accepts `*`, `/`, and `**` or `^`
//! for powers; `/` binds to the single term that follows it.

use super::dimension::{narrow_exponent, Dimension, MAX_EXPONENT};
use super::error::{UnitError, UnitResult};
use super::registry::{UnitDef, UnitRegistry};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

/// Product of registered units with integer exponents
#[derive(Debug, Clone)]
pub struct Unit {
    factors: Vec<(Arc<UnitDef>, i8)>,
    numerator: f64,
    denominator: f64,
    dimension: Dimension,
}

impl Unit {
    pub fn dimensionless() -> Self {
        Self {
            factors: Vec::new(),
            numerator: 1.0,
            denominator: 1.0,
            dimension: Dimension::DIMENSIONLESS,
        }
    }

    /// Unit made of a single registered definition
    pub fn from_def(def: Arc<UnitDef>) -> Self {
        Self {
            numerator: def.numerator(),
            denominator: def.denominator(),
            dimension: def.dimension(),
            factors: vec![(def, 1)],
        }
    }

    /// Parse a unit expression against the standard registry
    pub fn parse(expr: &str) -> UnitResult<Self> {
        Self::parse_in(UnitRegistry::standard(), expr)
    }

    pub fn parse_in(registry: &UnitRegistry, expr: &str) -> UnitResult<Self> {
        Parser::new(registry, expr).parse()
    }

    /// Merge repeated definitions and compute the scale and dimension.
    ///
    /// Returns `None` when a merged exponent leaves `-MAX_EXPONENT..=MAX_EXPONENT`.
    fn from_factors(raw: Vec<(Arc<UnitDef>, i32)>) -> Option<Self> {
        let mut merged: Vec<(Arc<UnitDef>, i32)> = Vec::with_capacity(raw.len());
        for (def, exp) in raw {
            match merged.iter_mut().find(|(d, _)| d.name() == def.name()) {
                Some((_, existing)) => *existing = (*existing).checked_add(exp)?,
                None => merged.push((def, exp)),
            }
        }
        let mut factors = Vec::with_capacity(merged.len());
        for (def, exp) in merged {
            if exp != 0 {
                factors.push((def, narrow_exponent(exp)?));
            }
        }

        let mut numerator = 1.0;
        let mut denominator = 1.0;
        let mut dimension = Dimension::DIMENSIONLESS;
        for (def, exp) in &factors {
            let power = i32::from(exp.unsigned_abs());
            if *exp > 0 {
                numerator *= def.numerator().powi(power);
                denominator *= def.denominator().powi(power);
            } else {
                numerator *= def.denominator().powi(power);
                denominator *= def.numerator().powi(power);
            }
            dimension = dimension.checked_multiply(def.dimension().checked_powi(*exp)?)?;
        }

        Some(Self {
            factors,
            numerator,
            denominator,
            dimension,
        })
    }

    fn compose(raw: Vec<(Arc<UnitDef>, i32)>, expr: impl FnOnce() -> String) -> UnitResult<Unit> {
        Self::from_factors(raw).ok_or_else(|| UnitError::malformed(expr(), EXPONENT_RANGE))
    }

    fn widened(&self) -> impl Iterator<Item = (Arc<UnitDef>, i32)> + '_ {
        self.factors
            .iter()
            .map(|(def, exp)| (def.clone(), i32::from(*exp)))
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Size of this unit in base units
    pub fn scale(&self) -> f64 {
        self.numerator / self.denominator
    }

    pub fn is_dimensionless(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn factors(&self) -> impl Iterator<Item = (&UnitDef, i8)> {
        self.factors.iter().map(|(def, exp)| (def.as_ref(), *exp))
    }

    /// Product of two units
    pub fn multiply(&self, other: &Unit) -> UnitResult<Unit> {
        let raw = self.widened().chain(other.widened()).collect();
        Self::compose(raw, || format!("({}) * ({})", self, other))
    }

    /// Quotient of two units
    pub fn per(&self, other: &Unit) -> UnitResult<Unit> {
        let raw = self
            .widened()
            .chain(other.widened().map(|(def, exp)| (def, -exp)))
            .collect();
        Self::compose(raw, || format!("({}) / ({})", self, other))
    }

    pub fn powi(&self, power: i8) -> UnitResult<Unit> {
        let raw = self
            .widened()
            .map(|(def, exp)| (def, exp * i32::from(power)))
            .collect();
        Self::compose(raw, || format!("({}) ** {}", self, power))
    }

    /// Re-express `magnitude` (given in this unit) in `target`.
    ///
    /// The scale products are combined before dividing so that ratios of
    /// exactly representable scales (e.g. minutes to hours) stay exact.
    pub(crate) fn convert_magnitude(&self, magnitude: f64, target: &Unit) -> UnitResult<f64> {
        if self.dimension != target.dimension {
            return Err(UnitError::mismatch(
                format!("{} {}", magnitude, self),
                target.dimension,
                self.dimension,
            ));
        }
        Ok(magnitude * self.numerator * target.denominator
            / (self.denominator * target.numerator))
    }

    fn sorted_terms(&self) -> Vec<(&str, i8)> {
        let mut terms: Vec<_> = self
            .factors
            .iter()
            .map(|(def, exp)| (def.name(), *exp))
            .collect();
        terms.sort();
        terms
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_terms() == other.sorted_terms()
    }
}

const EXPONENT_RANGE: &str = "unit exponent out of range";

fn write_factor(f: &mut fmt::Formatter<'_>, name: &str, exponent: i8) -> fmt::Result {
    if exponent == 1 {
        write!(f, "{}", name)
    } else {
        write!(f, "{} ** {}", name, exponent)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.factors.is_empty() {
            return write!(f, "dimensionless");
        }

        let mut first = true;
        for (def, exp) in self.factors.iter().filter(|(_, exp)| *exp > 0) {
            if !first {
                write!(f, " * ")?;
            }
            write_factor(f, def.name(), *exp)?;
            first = false;
        }
        if first {
            write!(f, "1")?;
        }
        for (def, exp) in self.factors.iter().filter(|(_, exp)| *exp < 0) {
            write!(f, " / ")?;
            write_factor(f, def.name(), -exp)?;
        }
        Ok(())
    }
}

/// Recursive-descent parser for unit expressions
struct Parser<'a> {
    registry: &'a UnitRegistry,
    input: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(registry: &'a UnitRegistry, input: &'a str) -> Self {
        Self {
            registry,
            input,
            chars: input.chars().peekable(),
        }
    }

    fn parse(mut self) -> UnitResult<Unit> {
        self.skip_whitespace();
        if self.chars.peek().is_none() {
            return Ok(Unit::dimensionless());
        }

        let mut raw = Vec::new();
        let mut sign = 1;
        loop {
            if let Some((def, exp)) = self.term()? {
                raw.push((def, sign * i32::from(exp)));
            }
            self.skip_whitespace();
            match self.chars.next() {
                None => break,
                Some('*') => sign = 1,
                Some('/') => sign = -1,
                Some(c) => return Err(self.error(format!("unexpected character '{}'", c))),
            }
        }
        Unit::from_factors(raw).ok_or_else(|| self.error(EXPONENT_RANGE))
    }

    /// A symbol with an optional power; the literal `1` yields no factor
    fn term(&mut self) -> UnitResult<Option<(Arc<UnitDef>, i8)>> {
        self.skip_whitespace();
        let symbol = match self.chars.peek().copied() {
            Some('1') => {
                self.chars.next();
                None
            }
            Some(c) if is_symbol_start(c) => Some(self.symbol()),
            Some(c) => return Err(self.error(format!("expected a unit, found '{}'", c))),
            None => return Err(self.error("expected a unit after operator")),
        };
        let exp = self.power()?;

        match symbol {
            Some(symbol) => Ok(Some((self.registry.lookup(&symbol)?, exp))),
            None => Ok(None),
        }
    }

    fn symbol(&mut self) -> String {
        let mut symbol = String::new();
        while let Some(c) = self.chars.peek() {
            if is_symbol_start(*c) || c.is_ascii_digit() {
                symbol.push(*c);
                self.chars.next();
            } else {
                break;
            }
        }
        symbol
    }

    fn power(&mut self) -> UnitResult<i8> {
        self.skip_whitespace();
        let mut lookahead = self.chars.clone();
        match lookahead.next() {
            Some('^') => {
                self.chars.next();
            }
            Some('*') if lookahead.next() == Some('*') => {
                self.chars.next();
                self.chars.next();
            }
            _ => return Ok(1),
        }

        self.skip_whitespace();
        let mut digits = String::new();
        if self.chars.peek() == Some(&'-') {
            digits.push('-');
            self.chars.next();
        }
        while let Some(c) = self.chars.peek().filter(|c| c.is_ascii_digit()) {
            digits.push(*c);
            self.chars.next();
        }
        let exp = digits
            .parse::<i32>()
            .map_err(|_| self.error("exponent must be a small integer"))?;
        narrow_exponent(exp).ok_or_else(|| {
            self.error(format!("exponent must be within -{0}..={0}", MAX_EXPONENT))
        })
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn error(&self, reason: impl Into<String>) -> UnitError {
        UnitError::malformed(self.input, reason)
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ratio() {
        let unit = Unit::parse("usd/hour").unwrap();
        assert_eq!(unit.dimension(), Dimension::CURRENCY_RATE);
        assert_eq!(unit.to_string(), "usd / hour");
        assert_eq!(unit, Unit::parse("usd / h").unwrap());
    }

    #[test]
    fn test_parse_powers() {
        let cubic = Unit::parse("m ** 3").unwrap();
        assert_eq!(cubic, Unit::parse("m^3").unwrap());
        assert_eq!(cubic.dimension(), Unit::parse("liter").unwrap().dimension());
        assert_eq!(cubic.to_string(), "meter ** 3");
        assert_eq!(Unit::parse("1 / hour").unwrap().to_string(), "1 / hour");
    }

    #[test]
    fn test_repeated_symbols_merge() {
        let unit = Unit::parse("hour * hour / hour").unwrap();
        assert_eq!(unit, Unit::parse("hour").unwrap());
        assert!(Unit::parse("s / s").unwrap().is_dimensionless());
    }

    #[test]
    fn test_division_binds_to_next_term() {
        let unit = Unit::parse("usd / hour / core").unwrap();
        assert_eq!(unit.to_string(), "usd / hour / core");
        assert_eq!(
            unit.dimension(),
            Dimension::CURRENCY / Dimension::TIME / Dimension::COMPUTATION
        );
    }

    #[test]
    fn test_compose() {
        let req = Unit::parse("req").unwrap();
        let minute = Unit::parse("min").unwrap();
        let rate = req.per(&minute).unwrap();
        assert_eq!(rate.to_string(), "req / minute");
        assert_eq!(rate.multiply(&minute).unwrap(), req);
        assert_eq!(minute.powi(-1).unwrap(), Unit::parse("1 / min").unwrap());
    }

    #[test]
    fn test_exponent_range() {
        let err = Unit::parse("liter^50").unwrap_err();
        assert!(matches!(err, UnitError::MalformedQuantity { .. }), "{}", err);
        assert!(Unit::parse("s^100 * s^100").is_err());
        assert!(Unit::parse("s^-100 / s^100").is_err());
        assert!(Unit::parse("s ** -128").is_err());
        assert!(Unit::parse("s ** 300").is_err());

        let lowest = Unit::parse("s ** -127").unwrap();
        assert_eq!(lowest.to_string(), "1 / second ** 127");
        assert_eq!(Unit::parse("s^100 / s^100").unwrap(), Unit::dimensionless());

        let high = Unit::parse("s^100").unwrap();
        assert!(high.multiply(&high).is_err());
        assert!(high.per(&high.powi(-1).unwrap()).is_err());
        assert!(high.powi(2).is_err());
        assert!(Unit::parse("s").unwrap().powi(i8::MIN).is_err());
    }

    #[test]
    fn test_exact_scales() {
        let hour = Unit::parse("hour").unwrap();
        let minute = Unit::parse("minute").unwrap();
        assert_eq!(hour.convert_magnitude(1.0, &minute).unwrap(), 60.0);
        assert_eq!(minute.convert_magnitude(15.0, &hour).unwrap(), 0.25);

        let cores = Unit::parse("cores").unwrap();
        let millicores = Unit::parse("millicores").unwrap();
        assert_eq!(cores.convert_magnitude(1.0, &millicores).unwrap(), 1000.0);
    }

    #[test]
    fn test_convert_rejects_other_dimension() {
        let hour = Unit::parse("hour").unwrap();
        let usd = Unit::parse("usd").unwrap();
        assert!(hour
            .convert_magnitude(1.0, &usd)
            .unwrap_err()
            .is_dimensionality_mismatch());
    }

    #[test]
    fn test_unknown_and_malformed() {
        assert!(Unit::parse("eur / hour").unwrap_err().is_unrecognized_unit());
        assert!(matches!(
            Unit::parse("usd /"),
            Err(UnitError::MalformedQuantity { .. })
        ));
        assert!(matches!(
            Unit::parse("usd % hour"),
            Err(UnitError::MalformedQuantity { .. })
        ));
        assert!(matches!(
            Unit::parse("m ** x"),
            Err(UnitError::MalformedQuantity { .. })
        ));
    }

    #[test]
    fn test_empty_is_dimensionless() {
        let unit = Unit::parse("  ").unwrap();
        assert!(unit.is_dimensionless());
        assert_eq!(unit.to_string(), "dimensionless");
    }
}
