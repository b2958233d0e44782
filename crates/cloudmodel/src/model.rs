//! Core data model for cloud cost/capacity planning problems
//!
//! A [`Problem`] owns a [`System`] (instance classes, container classes and
//! the performance table) and one [`WorkloadSeries`] per [`App`]. Instance
//! and container classes are shared through `Arc` and identified by
//! pointer, so the same class object must be used in the system lists and
//! in the performance table.

use crate::error::{ModelError, ModelResult};
use crate::units::{ComputationalUnits, CurrencyPerTime, Requests, RequestsPerTime, Storage, Time};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Upper bound for instance class capacity, in millicores
pub const MAX_MILLICORES: f64 = 1e9;

/// Default intra-slot arrival distribution
pub const DEFAULT_DISTRIBUTION: &str = "exponential";

/// Version stamped on problems built by this crate
pub const MODEL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct App {
    pub name: String,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new("unnamed")
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "App('{}')", self.name)
    }
}

/// Deployment-capacity restriction shared by a group of instance classes
/// (usually a region or availability zone)
#[derive(Debug, Clone, PartialEq)]
pub struct LimitingSet {
    pub name: String,
    /// Maximum number of VMs running in the set; `None` means no limit
    pub max_vms: Option<u32>,
    /// Maximum number of cores running in the set; `None` means no limit
    pub max_cores: Option<ComputationalUnits>,
}

impl LimitingSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_vms: None,
            max_cores: None,
        }
    }

    pub fn with_max_vms(mut self, max_vms: u32) -> Self {
        self.max_vms = Some(max_vms);
        self
    }

    pub fn with_max_cores(mut self, max_cores: ComputationalUnits) -> Self {
        self.max_cores = Some(max_cores);
        self
    }
}

impl fmt::Display for LimitingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LimitingSet(name='{}', max_vms=", self.name)?;
        match self.max_vms {
            Some(n) => write!(f, "{}", n)?,
            None => write!(f, "none")?,
        }
        match &self.max_cores {
            Some(cores) => write!(f, ", max_cores='{}')", cores),
            None => write!(f, ", max_cores=none)"),
        }
    }
}

/// A priced VM offering
///
/// Fields are read-only so that the capacity check done in
/// [`InstanceClass::new`] cannot be bypassed.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceClass {
    name: String,
    price: CurrencyPerTime,
    cores: ComputationalUnits,
    mem: Storage,
    limit: Option<u32>,
    limiting_sets: Vec<Arc<LimitingSet>>,
    is_reserved: bool,
    is_private: bool,
}

impl InstanceClass {
    /// Create an instance class.
    ///
    /// A capacity that is negative, NaN, infinite or above
    /// [`MAX_MILLICORES`] millicores is silently replaced by zero.
    // TODO: turn the clamp into an error once callers stop relying on it
    pub fn new(
        name: impl Into<String>,
        price: CurrencyPerTime,
        cores: ComputationalUnits,
        mem: Storage,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            cores: clamp_capacity(cores),
            mem,
            limit: None,
            limiting_sets: Vec::new(),
            is_reserved: false,
            is_private: false,
        }
    }

    /// Maximum number of VMs of this class; `None` means no limit
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_limiting_set(mut self, limiting_set: Arc<LimitingSet>) -> Self {
        self.limiting_sets.push(limiting_set);
        self
    }

    pub fn reserved(mut self, is_reserved: bool) -> Self {
        self.is_reserved = is_reserved;
        self
    }

    pub fn private(mut self, is_private: bool) -> Self {
        self.is_private = is_private;
        self
    }

    /// Copy of this class with another price; every other field is kept
    pub fn repriced(&self, price: CurrencyPerTime) -> Self {
        Self {
            price,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> &CurrencyPerTime {
        &self.price
    }

    pub fn cores(&self) -> &ComputationalUnits {
        &self.cores
    }

    pub fn mem(&self) -> &Storage {
        &self.mem
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    pub fn limiting_sets(&self) -> &[Arc<LimitingSet>] {
        &self.limiting_sets
    }

    pub fn is_reserved(&self) -> bool {
        self.is_reserved
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }
}

fn clamp_capacity(cores: ComputationalUnits) -> ComputationalUnits {
    let valid = cores
        .to("millicore")
        .map(|mc| mc.magnitude().is_finite() && (0.0..=MAX_MILLICORES).contains(&mc.magnitude()))
        .unwrap_or(false);
    if valid {
        cores
    } else {
        cores.with_magnitude(0.0)
    }
}

impl fmt::Display for InstanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InstanceClass(name='{}', price='{}', cores='{}', mem='{}')",
            self.name, self.price, self.cores, self.mem
        )
    }
}

/// Container footprint for one application
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerClass {
    pub name: String,
    pub cores: ComputationalUnits,
    pub mem: Storage,
    pub app: App,
    /// CPU limit enforced by the orchestrator; `None` means no limit
    pub limit: Option<u32>,
}

impl ContainerClass {
    pub fn new(name: impl Into<String>, cores: ComputationalUnits, mem: Storage, app: App) -> Self {
        Self {
            name: name.into(),
            cores,
            mem,
            app,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for ContainerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ContainerClass(name='{}', cores='{}', mem='{}', app={}, limit=",
            self.name, self.cores, self.mem, self.app
        )?;
        match self.limit {
            Some(limit) => write!(f, "{})", limit),
            None => write!(f, "none)"),
        }
    }
}

/// Throughput of an (instance class, container class, app) combination
#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    pub value: RequestsPerTime,
    /// 95th percentile response time, when measured
    pub slo95: Option<Time>,
}

impl Performance {
    pub fn new(value: RequestsPerTime) -> Self {
        Self { value, slo95: None }
    }

    pub fn with_slo95(mut self, slo95: Time) -> Self {
        self.slo95 = Some(slo95);
        self
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Performance(value='{}'", self.value)?;
        match &self.slo95 {
            Some(slo) => write!(f, ", slo95='{}')", slo),
            None => write!(f, ")"),
        }
    }
}

/// A row of the performance table
#[derive(Debug, Clone)]
pub struct PerformanceEntry {
    pub instance_class: Arc<InstanceClass>,
    /// `None` for deployments that run the app without containers
    pub container_class: Option<Arc<ContainerClass>>,
    pub app: App,
    pub performance: Performance,
}

impl PerformanceEntry {
    fn matches(
        &self,
        instance_class: &Arc<InstanceClass>,
        container_class: Option<&Arc<ContainerClass>>,
        app: &App,
    ) -> bool {
        let same_container = match (&self.container_class, container_class) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        Arc::ptr_eq(&self.instance_class, instance_class) && same_container && self.app == *app
    }
}

/// Performance table keyed by (instance class, container class, app).
///
/// Classes are compared by identity, apps by value. Insertion order is
/// preserved.
#[derive(Debug, Clone, Default)]
pub struct PerformanceTable {
    entries: Vec<PerformanceEntry>,
}

impl PerformanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a performance, returning the one previously stored for the key
    pub fn insert(
        &mut self,
        instance_class: Arc<InstanceClass>,
        container_class: Option<Arc<ContainerClass>>,
        app: App,
        performance: Performance,
    ) -> Option<Performance> {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.matches(&instance_class, container_class.as_ref(), &app))
        {
            return Some(std::mem::replace(&mut entry.performance, performance));
        }

        self.entries.push(PerformanceEntry {
            instance_class,
            container_class,
            app,
            performance,
        });
        None
    }

    pub fn get(
        &self,
        instance_class: &Arc<InstanceClass>,
        container_class: Option<&Arc<ContainerClass>>,
        app: &App,
    ) -> Option<&Performance> {
        self.entries
            .iter()
            .find(|e| e.matches(instance_class, container_class, app))
            .map(|e| &e.performance)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerformanceEntry> {
        self.entries.iter()
    }

    /// Apps with at least one entry
    pub fn apps(&self) -> BTreeSet<&App> {
        self.entries.iter().map(|e| &e.app).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Request load of one application over consecutive timeslots
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSeries {
    pub description: String,
    /// Requests arriving in each timeslot
    pub values: Vec<Requests>,
    pub time_slot_size: Time,
    /// Distribution of interarrival times inside a slot
    pub intra_slot_distribution: String,
}

impl WorkloadSeries {
    pub fn new(description: impl Into<String>, values: Vec<Requests>, time_slot_size: Time) -> Self {
        Self {
            description: description.into(),
            values,
            time_slot_size,
            intra_slot_distribution: DEFAULT_DISTRIBUTION.to_string(),
        }
    }

    pub fn with_distribution(mut self, distribution: impl Into<String>) -> Self {
        self.intra_slot_distribution = distribution.into();
        self
    }
}

impl fmt::Display for WorkloadSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorkloadSeries(description='{}', time_slot_size='{}')",
            self.description, self.time_slot_size
        )
    }
}

/// Infrastructure and apps
#[derive(Debug, Clone)]
pub struct System {
    pub name: String,
    pub instance_classes: Vec<Arc<InstanceClass>>,
    pub container_classes: Vec<Arc<ContainerClass>>,
    pub performances: PerformanceTable,
}

impl System {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_classes: Vec::new(),
            container_classes: Vec::new(),
            performances: PerformanceTable::new(),
        }
    }

    /// Every class referenced by the performance table must be listed
    pub fn validate(&self) -> ModelResult<()> {
        for entry in self.performances.iter() {
            let ic = &entry.instance_class;
            if !self.instance_classes.iter().any(|i| Arc::ptr_eq(i, ic)) {
                return Err(ModelError::UnlistedInstanceClass(ic.name().to_string()));
            }
            if let Some(cc) = &entry.container_class {
                if !self.container_classes.iter().any(|c| Arc::ptr_eq(c, cc)) {
                    return Err(ModelError::UnlistedContainerClass(cc.name.clone()));
                }
            }
        }

        let apps = self.performances.apps();
        for cc in &self.container_classes {
            if !apps.contains(&cc.app) {
                return Err(ModelError::ContainerAppWithoutPerformance {
                    container: cc.name.clone(),
                    app: cc.app.name.clone(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "System(name='{}')", self.name)
    }
}

/// A complete problem handed to an optimizer
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub system: System,
    pub workloads: BTreeMap<App, WorkloadSeries>,
    /// Length of the scheduling window
    pub sched_time_size: Time,
    pub version: String,
}

impl Problem {
    pub fn new(
        name: impl Into<String>,
        system: System,
        workloads: BTreeMap<App, WorkloadSeries>,
        sched_time_size: Time,
    ) -> Self {
        Self {
            name: name.into(),
            system,
            workloads,
            sched_time_size,
            version: MODEL_VERSION.to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Check that workloads, containers and performances refer to the same
    /// apps and classes. The performance table is the reference.
    pub fn validate(&self) -> ModelResult<()> {
        self.system.validate()?;

        let apps = self.system.performances.apps();
        for app in self.workloads.keys() {
            if !apps.contains(app) {
                return Err(ModelError::WorkloadWithoutPerformance(app.name.clone()));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Problem(name='{}', system={}, version='{}')",
            self.name, self.system, self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance_class(name: &str, cores: &str) -> InstanceClass {
        InstanceClass::new(
            name,
            CurrencyPerTime::parse("0.5 usd/h").unwrap(),
            ComputationalUnits::parse(cores).unwrap(),
            Storage::parse("4 GiB").unwrap(),
        )
    }

    fn system_with_one_entry() -> (System, Arc<InstanceClass>, Arc<ContainerClass>, App) {
        let app = App::new("web");
        let ic = Arc::new(instance_class("m5.large", "2 cores"));
        let cc = Arc::new(ContainerClass::new(
            "small",
            ComputationalUnits::parse("500 millicores").unwrap(),
            Storage::parse("1 GiB").unwrap(),
            app.clone(),
        ));
        let mut system = System::new("aws");
        system.instance_classes.push(ic.clone());
        system.container_classes.push(cc.clone());
        system.performances.insert(
            ic.clone(),
            Some(cc.clone()),
            app.clone(),
            Performance::new(RequestsPerTime::parse("10 req/s").unwrap()),
        );
        (system, ic, cc, app)
    }

    #[test]
    fn test_display_app() {
        assert_eq!(App::new("foo").to_string(), "App('foo')");
        assert_eq!(App::default().name, "unnamed");
    }

    #[test]
    fn test_display_limiting_set() {
        let ls = LimitingSet::new("foo")
            .with_max_vms(0)
            .with_max_cores(ComputationalUnits::parse("200 cores").unwrap());
        assert_eq!(
            ls.to_string(),
            "LimitingSet(name='foo', max_vms=0, max_cores='200 core')"
        );
        assert_eq!(
            LimitingSet::new("bar").to_string(),
            "LimitingSet(name='bar', max_vms=none, max_cores=none)"
        );
    }

    #[test]
    fn test_display_instance_class() {
        let ic = instance_class("foo", "2 cores");
        assert_eq!(
            ic.to_string(),
            "InstanceClass(name='foo', price='0.5 usd / hour', cores='2 core', mem='4 gibibyte')"
        );
    }

    #[test]
    fn test_display_container_class() {
        let cc = ContainerClass::new(
            "foo",
            ComputationalUnits::parse("1000 millicores").unwrap(),
            Storage::parse("0.5 GiB").unwrap(),
            App::new("bar"),
        )
        .with_limit(0);
        assert_eq!(
            cc.to_string(),
            "ContainerClass(name='foo', cores='1000 millicore', mem='0.5 gibibyte', app=App('bar'), limit=0)"
        );
    }

    #[test]
    fn test_display_performance_and_series() {
        let perf = Performance::new(RequestsPerTime::parse("1 req/s").unwrap())
            .with_slo95(Time::parse("10ms").unwrap());
        assert_eq!(
            perf.to_string(),
            "Performance(value='1 req / second', slo95='10 millisecond')"
        );

        let wls = WorkloadSeries::new(
            "foo",
            vec![Requests::parse("1 req").unwrap(), Requests::parse("2 req").unwrap()],
            Time::parse("1 s").unwrap(),
        )
        .with_distribution("uniform");
        assert_eq!(
            wls.to_string(),
            "WorkloadSeries(description='foo', time_slot_size='1 second')"
        );
        assert_eq!(wls.intra_slot_distribution, "uniform");
    }

    #[test]
    fn test_display_problem() {
        let problem = Problem::new(
            "foo",
            System::new("bar"),
            BTreeMap::new(),
            Time::parse("15 min").unwrap(),
        );
        assert_eq!(
            problem.to_string(),
            format!("Problem(name='foo', system=System(name='bar'), version='{}')", MODEL_VERSION)
        );
        assert_eq!(problem.with_version("0.1.0").version, "0.1.0");
    }

    #[test]
    fn test_invalid_capacity_is_clamped_to_zero() {
        for raw in ["-1 cores", "NaN cores", "inf cores", "2000000 cores"] {
            let ic = instance_class("bad", raw);
            assert_eq!(ic.cores().magnitude(), 0.0, "{} should be clamped", raw);
            assert_eq!(ic.cores().unit().to_string(), "core");
        }
    }

    #[test]
    fn test_valid_capacity_is_kept() {
        let ic = instance_class("ok", "1000000 cores");
        assert_eq!(ic.cores().magnitude(), 1_000_000.0);
        let ic = instance_class("ok", "250 millicores");
        assert_eq!(ic.cores().magnitude(), 250.0);
        let ic = instance_class("ok", "0 cores");
        assert_eq!(ic.cores().magnitude(), 0.0);
    }

    #[test]
    fn test_builder_flags() {
        let ls = Arc::new(LimitingSet::new("us-east-1"));
        let ic = instance_class("m5", "2 cores")
            .with_limit(20)
            .with_limiting_set(ls.clone())
            .reserved(true)
            .private(true);
        assert_eq!(ic.limit(), Some(20));
        assert!(Arc::ptr_eq(&ic.limiting_sets()[0], &ls));
        assert!(ic.is_reserved());
        assert!(ic.is_private());

        let repriced = ic.repriced(CurrencyPerTime::parse("1 usd/h").unwrap());
        assert_eq!(repriced.price().magnitude(), 1.0);
        assert_eq!(repriced.limit(), Some(20));
        assert!(repriced.is_reserved());
    }

    #[test]
    fn test_performance_table_identity_keys() {
        let (system, ic, cc, app) = system_with_one_entry();
        assert!(system.performances.get(&ic, Some(&cc), &app).is_some());
        assert!(system.performances.get(&ic, None, &app).is_none());

        // an equal but distinct instance class is a different key
        let twin = Arc::new(instance_class("m5.large", "2 cores"));
        assert_eq!(*twin, *ic);
        assert!(system.performances.get(&twin, Some(&cc), &app).is_none());
    }

    #[test]
    fn test_performance_table_insert_replaces() {
        let (mut system, ic, cc, app) = system_with_one_entry();
        let previous = system.performances.insert(
            ic.clone(),
            Some(cc.clone()),
            app.clone(),
            Performance::new(RequestsPerTime::parse("20 req/s").unwrap()),
        );
        assert_eq!(previous.unwrap().value.magnitude(), 10.0);
        assert_eq!(system.performances.len(), 1);
        assert_eq!(
            system.performances.get(&ic, Some(&cc), &app).unwrap().value.magnitude(),
            20.0
        );
    }

    #[test]
    fn test_validate_consistent_problem() {
        let (system, _, _, app) = system_with_one_entry();
        let mut workloads = BTreeMap::new();
        workloads.insert(
            app,
            WorkloadSeries::new("w", vec![], Time::parse("1 hour").unwrap()),
        );
        let problem = Problem::new("p", system, workloads, Time::parse("1 hour").unwrap());
        assert!(problem.validate().is_ok());
    }

    #[test]
    fn test_validate_unlisted_instance_class() {
        let (mut system, _, _, _) = system_with_one_entry();
        system.instance_classes.clear();
        assert!(matches!(
            system.validate(),
            Err(ModelError::UnlistedInstanceClass(name)) if name == "m5.large"
        ));
    }

    #[test]
    fn test_validate_unlisted_container_class() {
        let (mut system, _, _, _) = system_with_one_entry();
        system.container_classes.clear();
        assert!(matches!(
            system.validate(),
            Err(ModelError::UnlistedContainerClass(name)) if name == "small"
        ));
    }

    #[test]
    fn test_validate_workload_without_performance() {
        let (system, _, _, _) = system_with_one_entry();
        let mut workloads = BTreeMap::new();
        workloads.insert(
            App::new("batch"),
            WorkloadSeries::new("w", vec![], Time::parse("1 hour").unwrap()),
        );
        let problem = Problem::new("p", system, workloads, Time::parse("1 hour").unwrap());
        assert!(matches!(
            problem.validate(),
            Err(ModelError::WorkloadWithoutPerformance(app)) if app == "batch"
        ));
    }

    #[test]
    fn test_validate_container_app_without_performance() {
        let (mut system, _, _, _) = system_with_one_entry();
        system.container_classes.push(Arc::new(ContainerClass::new(
            "worker",
            ComputationalUnits::parse("1 core").unwrap(),
            Storage::parse("1 GiB").unwrap(),
            App::new("batch"),
        )));
        assert!(matches!(
            system.validate(),
            Err(ModelError::ContainerAppWithoutPerformance { .. })
        ));
    }
}
