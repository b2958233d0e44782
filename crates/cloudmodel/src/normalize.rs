//! Time-unit normalization
//!
//! Rewrites every time-denominated quantity of a [`Problem`] into a single
//! time unit, producing a new problem. The input is never modified.

use crate::model::{InstanceClass, Performance, PerformanceTable, Problem, System, WorkloadSeries};
use crate::units::{BaseDimension, Dimension, Unit, UnitError, UnitRegistry, UnitResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Normalize `problem` so that all times are expressed in `unit`
/// (e.g. `"hour"`, `"min"`, `"s"`), using the standard registry.
pub fn normalize_time_units(problem: &Problem, unit: &str) -> UnitResult<Problem> {
    normalize_time_units_in(UnitRegistry::standard(), problem, unit)
}

/// Normalization against an explicit registry.
///
/// - `sched_time_size` is converted to the target unit
/// - workloads are rescaled with [`scale_workload_series`]
/// - prices become `<currency> / unit`
/// - performances become `<requests> / unit`, SLOs are converted to `unit`
///
/// Performance rows are re-keyed through a map from each original instance
/// class to its rescaled copy.
pub fn normalize_time_units_in(
    registry: &UnitRegistry,
    problem: &Problem,
    unit: &str,
) -> UnitResult<Problem> {
    let target = time_unit(registry, unit)?;
    let price_unit = Unit::from_def(registry.base_unit(BaseDimension::Currency)?).per(&target)?;
    let rate_unit = Unit::from_def(registry.base_unit(BaseDimension::Requests)?).per(&target)?;

    let workloads = problem
        .workloads
        .iter()
        .map(|(app, series)| Ok((app.clone(), scale_workload_series(series, &target)?)))
        .collect::<UnitResult<BTreeMap<_, _>>>()?;

    let mut rescaled: HashMap<*const InstanceClass, Arc<InstanceClass>> =
        HashMap::with_capacity(problem.system.instance_classes.len());
    let mut instance_classes = Vec::with_capacity(problem.system.instance_classes.len());
    for ic in &problem.system.instance_classes {
        let copy = Arc::new(ic.repriced(ic.price().to_unit(&price_unit)?));
        rescaled.insert(Arc::as_ptr(ic), copy.clone());
        instance_classes.push(copy);
    }

    let mut performances = PerformanceTable::new();
    for entry in problem.system.performances.iter() {
        let original = &entry.instance_class;
        let ic = match rescaled.get(&Arc::as_ptr(original)) {
            Some(ic) => ic.clone(),
            None => {
                warn!(
                    instance_class = original.name(),
                    "Instance class in performance table is missing from the system list"
                );
                let copy = Arc::new(original.repriced(original.price().to_unit(&price_unit)?));
                rescaled.insert(Arc::as_ptr(original), copy.clone());
                copy
            }
        };

        let performance = Performance {
            value: entry.performance.value.to_unit(&rate_unit)?,
            slo95: entry
                .performance
                .slo95
                .as_ref()
                .map(|slo| slo.to_unit(&target))
                .transpose()?,
        };
        performances.insert(ic, entry.container_class.clone(), entry.app.clone(), performance);
    }

    debug!(
        target_unit = %target,
        instance_classes = instance_classes.len(),
        performances = performances.len(),
        workloads = workloads.len(),
        "Normalized problem time units"
    );

    Ok(Problem {
        name: problem.name.clone(),
        system: System {
            name: problem.system.name.clone(),
            instance_classes,
            container_classes: problem.system.container_classes.clone(),
            performances,
        },
        workloads,
        sched_time_size: problem.sched_time_size.to_unit(&target)?,
        version: problem.version.clone(),
    })
}

/// Re-express a workload series with its slot size in `target`.
///
/// Each value is multiplied by `original / converted` slot magnitude, so a
/// series given per 15 minutes and normalized to hours is multiplied by 60.
/// A slot of magnitude zero gives a factor of zero.
pub fn scale_workload_series(series: &WorkloadSeries, target: &Unit) -> UnitResult<WorkloadSeries> {
    let converted = series.time_slot_size.to_unit(target)?;
    let original = series.time_slot_size.magnitude();
    let factor = if original == 0.0 || converted.magnitude() == 0.0 {
        0.0
    } else {
        original / converted.magnitude()
    };

    Ok(WorkloadSeries {
        description: series.description.clone(),
        values: series.values.iter().map(|v| v.scaled(factor)).collect(),
        time_slot_size: converted,
        intra_slot_distribution: series.intra_slot_distribution.clone(),
    })
}

fn time_unit(registry: &UnitRegistry, unit: &str) -> UnitResult<Unit> {
    let target = Unit::parse_in(registry, unit)?;
    if target.dimension() != Dimension::TIME {
        return Err(UnitError::DimensionalityMismatch {
            value: unit.to_string(),
            expected: Dimension::TIME,
            found: target.dimension(),
        });
    }
    Ok(target)
}
