//! Quantity conversion and unit listing

use anyhow::{Context, Result};
use clap::ValueEnum;
use cloudmodel::units::{
    ComputationalUnits, Currency, CurrencyPerTime, Dimension, Quantity, Requests,
    RequestsPerTime, Storage, Time, UnitRegistry,
};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{format_magnitude, print_serialized, print_table, OutputFormat};

/// Dimensioned quantity kinds selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuantityKind {
    Time,
    Currency,
    CurrencyPerTime,
    Computation,
    Storage,
    Requests,
    RequestsPerTime,
}

impl QuantityKind {
    pub fn dimension(self) -> Dimension {
        match self {
            QuantityKind::Time => Time::dimension(),
            QuantityKind::Currency => Currency::dimension(),
            QuantityKind::CurrencyPerTime => CurrencyPerTime::dimension(),
            QuantityKind::Computation => ComputationalUnits::dimension(),
            QuantityKind::Storage => Storage::dimension(),
            QuantityKind::Requests => Requests::dimension(),
            QuantityKind::RequestsPerTime => RequestsPerTime::dimension(),
        }
    }

    /// Parse through the matching checked type
    fn parse(self, input: &str) -> cloudmodel::UnitResult<Quantity> {
        Ok(match self {
            QuantityKind::Time => Time::parse(input)?.into_quantity(),
            QuantityKind::Currency => Currency::parse(input)?.into_quantity(),
            QuantityKind::CurrencyPerTime => CurrencyPerTime::parse(input)?.into_quantity(),
            QuantityKind::Computation => ComputationalUnits::parse(input)?.into_quantity(),
            QuantityKind::Storage => Storage::parse(input)?.into_quantity(),
            QuantityKind::Requests => Requests::parse(input)?.into_quantity(),
            QuantityKind::RequestsPerTime => RequestsPerTime::parse(input)?.into_quantity(),
        })
    }
}

/// Result of a conversion
#[derive(Debug, Serialize)]
pub struct Conversion {
    pub input: String,
    pub magnitude: f64,
    pub unit: String,
    pub dimension: String,
}

/// Row for the units table
#[derive(Debug, Serialize, Tabled)]
pub struct UnitRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Aliases")]
    pub aliases: String,
    #[tabled(rename = "Dimension")]
    pub dimension: String,
    #[tabled(rename = "Scale")]
    pub scale: String,
}

/// Convert `input` into `unit`, optionally checking its kind first
pub fn convert_quantity(input: &str, unit: &str, kind: Option<QuantityKind>) -> Result<Conversion> {
    let quantity = match kind {
        Some(kind) => kind.parse(input),
        None => Quantity::parse(input),
    }
    .with_context(|| format!("Invalid quantity '{}'", input))?;

    let converted = quantity
        .to(unit)
        .with_context(|| format!("Cannot convert '{}' to '{}'", input, unit))?;

    Ok(Conversion {
        input: input.to_string(),
        magnitude: converted.magnitude(),
        unit: converted.unit().to_string(),
        dimension: converted.dimension().to_string(),
    })
}

pub fn convert(input: &str, unit: &str, kind: Option<QuantityKind>, format: OutputFormat) -> Result<()> {
    let conversion = convert_quantity(input, unit, kind)?;
    match format {
        OutputFormat::Table => println!(
            "{} = {} {}",
            conversion.input,
            format_magnitude(conversion.magnitude),
            conversion.unit
        ),
        _ => print_serialized(&conversion, format)?,
    }
    Ok(())
}

/// Units of the standard registry, optionally restricted to one kind
pub fn unit_rows(kind: Option<QuantityKind>) -> Vec<UnitRow> {
    let registry = UnitRegistry::standard();
    let units: Vec<_> = match kind {
        Some(kind) => registry.units_of(kind.dimension()).collect(),
        None => registry.units().collect(),
    };

    units
        .into_iter()
        .map(|unit| UnitRow {
            name: unit.def.name().to_string(),
            aliases: unit.aliases.join(", "),
            dimension: unit.def.dimension().to_string(),
            scale: format_magnitude(unit.def.scale()),
        })
        .collect()
}

pub fn list_units(kind: Option<QuantityKind>, format: OutputFormat) -> Result<()> {
    let rows = unit_rows(kind);
    match format {
        OutputFormat::Table => print_table("Units", rows),
        _ => print_serialized(&rows, format)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_untyped() {
        let c = convert_quantity("1 hour", "minute", None).unwrap();
        assert_eq!(c.magnitude, 60.0);
        assert_eq!(c.unit, "minute");
        assert_eq!(c.dimension, "[time]");
    }

    #[test]
    fn test_convert_checks_kind() {
        assert!(convert_quantity("2 liter", "core", Some(QuantityKind::Computation)).is_err());
        let c = convert_quantity("1 req/s", "req/min", Some(QuantityKind::RequestsPerTime)).unwrap();
        assert_eq!(c.magnitude, 60.0);
    }

    #[test]
    fn test_convert_reports_unknown_unit() {
        let err = convert_quantity("20 eur/hour", "usd/hour", None).unwrap_err();
        assert!(format!("{:#}", err).contains("eur"));
    }

    #[test]
    fn test_unit_rows_filtered() {
        let names: Vec<String> = unit_rows(Some(QuantityKind::Computation))
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["core", "vcore", "millicore"]);
        assert!(unit_rows(None).len() > names.len());
    }
}
