//! Problem documents (JSON / YAML)
//!
//! On disk, instance classes, container classes and limiting sets are
//! referenced by name. Loading a document resolves those names into the
//! shared objects of a [`Problem`]; names must therefore be unique.

use crate::error::{ModelError, ModelResult};
use crate::model::{
    App, ContainerClass, InstanceClass, LimitingSet, Performance, Problem, System, WorkloadSeries,
    DEFAULT_DISTRIBUTION, MODEL_VERSION,
};
use crate::units::{ComputationalUnits, CurrencyPerTime, Requests, RequestsPerTime, Storage, Time};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Serialization format, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> ModelResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(DocumentFormat::Json),
            Some("yaml") | Some("yml") => Ok(DocumentFormat::Yaml),
            _ => Err(ModelError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDocument {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub sched_time_size: Time,
    pub system: SystemDocument,
    #[serde(default)]
    pub workloads: Vec<WorkloadDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemDocument {
    pub name: String,
    #[serde(default)]
    pub limiting_sets: Vec<LimitingSetDocument>,
    #[serde(default)]
    pub instance_classes: Vec<InstanceClassDocument>,
    #[serde(default)]
    pub container_classes: Vec<ContainerClassDocument>,
    #[serde(default)]
    pub performances: Vec<PerformanceDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitingSetDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_vms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cores: Option<ComputationalUnits>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceClassDocument {
    pub name: String,
    pub price: CurrencyPerTime,
    pub cores: ComputationalUnits,
    pub mem: Storage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Names of the limiting sets this class belongs to
    #[serde(default)]
    pub limiting_sets: Vec<String>,
    #[serde(default)]
    pub is_reserved: bool,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerClassDocument {
    pub name: String,
    pub cores: ComputationalUnits,
    pub mem: Storage,
    pub app: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceDocument {
    pub instance_class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_class: Option<String>,
    pub app: String,
    pub value: RequestsPerTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slo95: Option<Time>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadDocument {
    pub app: String,
    #[serde(default)]
    pub description: String,
    /// Request counts per slot; plain numbers are read as `req`
    #[serde(deserialize_with = "deserialize_requests")]
    pub values: Vec<Requests>,
    pub time_slot_size: Time,
    #[serde(default = "default_distribution")]
    pub intra_slot_distribution: String,
}

fn default_version() -> String {
    MODEL_VERSION.to_string()
}

fn default_distribution() -> String {
    DEFAULT_DISTRIBUTION.to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRequests {
    Count(f64),
    Quantity(String),
}

fn deserialize_requests<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Requests>, D::Error> {
    Vec::<RawRequests>::deserialize(deserializer)?
        .into_iter()
        .map(|raw| match raw {
            RawRequests::Count(count) => Requests::new(count, "req"),
            RawRequests::Quantity(text) => Requests::parse(&text),
        })
        .collect::<Result<_, _>>()
        .map_err(serde::de::Error::custom)
}

/// Name → shared object index that refuses duplicates
fn index_by_name<T>(
    kind: &'static str,
    items: impl IntoIterator<Item = (String, Arc<T>)>,
) -> ModelResult<HashMap<String, Arc<T>>> {
    let mut index = HashMap::new();
    for (name, item) in items {
        if index.insert(name.clone(), item).is_some() {
            return Err(ModelError::DuplicateName { kind, name });
        }
    }
    Ok(index)
}

fn resolve<T>(
    index: &HashMap<String, Arc<T>>,
    kind: &'static str,
    name: &str,
    referrer: impl FnOnce() -> String,
) -> ModelResult<Arc<T>> {
    index
        .get(name)
        .cloned()
        .ok_or_else(|| ModelError::UnknownReference {
            kind,
            name: name.to_string(),
            referrer: referrer(),
        })
}

impl ProblemDocument {
    /// Resolve names into a [`Problem`]
    pub fn into_problem(self) -> ModelResult<Problem> {
        let system = self.system;

        let limiting_sets = index_by_name(
            "limiting set",
            system.limiting_sets.into_iter().map(|ls| {
                let mut set = LimitingSet::new(ls.name.clone());
                set.max_vms = ls.max_vms;
                set.max_cores = ls.max_cores;
                (ls.name, Arc::new(set))
            }),
        )?;

        let mut instance_classes = Vec::with_capacity(system.instance_classes.len());
        for doc in system.instance_classes {
            let mut ic = InstanceClass::new(doc.name.clone(), doc.price, doc.cores, doc.mem)
                .reserved(doc.is_reserved)
                .private(doc.is_private);
            if let Some(limit) = doc.limit {
                ic = ic.with_limit(limit);
            }
            for set in &doc.limiting_sets {
                let set = resolve(&limiting_sets, "limiting set", set, || {
                    format!("instance class '{}'", doc.name)
                })?;
                ic = ic.with_limiting_set(set);
            }
            instance_classes.push(Arc::new(ic));
        }
        let ic_index = index_by_name(
            "instance class",
            instance_classes
                .iter()
                .map(|ic| (ic.name().to_string(), ic.clone())),
        )?;

        let container_classes: Vec<Arc<ContainerClass>> = system
            .container_classes
            .into_iter()
            .map(|doc| {
                let mut cc = ContainerClass::new(doc.name, doc.cores, doc.mem, App::new(doc.app));
                cc.limit = doc.limit;
                Arc::new(cc)
            })
            .collect();
        let cc_index = index_by_name(
            "container class",
            container_classes
                .iter()
                .map(|cc| (cc.name.clone(), cc.clone())),
        )?;

        let mut resolved = System::new(system.name);
        for perf in system.performances {
            let referrer = || format!("performance of app '{}'", perf.app);
            let ic = resolve(&ic_index, "instance class", &perf.instance_class, referrer)?;
            let cc = match &perf.container_class {
                Some(name) => Some(resolve(&cc_index, "container class", name, referrer)?),
                None => None,
            };
            let mut performance = Performance::new(perf.value);
            performance.slo95 = perf.slo95;
            resolved
                .performances
                .insert(ic, cc, App::new(perf.app), performance);
        }
        resolved.instance_classes = instance_classes;
        resolved.container_classes = container_classes;

        let mut workloads = BTreeMap::new();
        for wl in self.workloads {
            let app = App::new(wl.app.clone());
            let series = WorkloadSeries::new(wl.description, wl.values, wl.time_slot_size)
                .with_distribution(wl.intra_slot_distribution);
            if workloads.insert(app, series).is_some() {
                return Err(ModelError::DuplicateName {
                    kind: "workload app",
                    name: wl.app,
                });
            }
        }

        Ok(Problem::new(self.name, resolved, workloads, self.sched_time_size).with_version(self.version))
    }

    /// Describe `problem` by names. Fails if two instance classes, container
    /// classes or limiting sets share a name.
    pub fn from_problem(problem: &Problem) -> ModelResult<Self> {
        let system = &problem.system;

        let mut limiting_sets: Vec<&Arc<LimitingSet>> = Vec::new();
        for ls in system
            .instance_classes
            .iter()
            .flat_map(|ic| ic.limiting_sets().iter())
        {
            if !limiting_sets.iter().any(|seen| Arc::ptr_eq(seen, ls)) {
                limiting_sets.push(ls);
            }
        }
        index_by_name(
            "limiting set",
            limiting_sets.iter().map(|ls| (ls.name.clone(), (*ls).clone())),
        )?;
        index_by_name(
            "instance class",
            system
                .instance_classes
                .iter()
                .map(|ic| (ic.name().to_string(), ic.clone())),
        )?;
        index_by_name(
            "container class",
            system
                .container_classes
                .iter()
                .map(|cc| (cc.name.clone(), cc.clone())),
        )?;

        Ok(Self {
            name: problem.name.clone(),
            version: problem.version.clone(),
            sched_time_size: problem.sched_time_size.clone(),
            system: SystemDocument {
                name: system.name.clone(),
                limiting_sets: limiting_sets
                    .iter()
                    .map(|ls| LimitingSetDocument {
                        name: ls.name.clone(),
                        max_vms: ls.max_vms,
                        max_cores: ls.max_cores.clone(),
                    })
                    .collect(),
                instance_classes: system
                    .instance_classes
                    .iter()
                    .map(|ic| InstanceClassDocument {
                        name: ic.name().to_string(),
                        price: ic.price().clone(),
                        cores: ic.cores().clone(),
                        mem: ic.mem().clone(),
                        limit: ic.limit(),
                        limiting_sets: ic.limiting_sets().iter().map(|ls| ls.name.clone()).collect(),
                        is_reserved: ic.is_reserved(),
                        is_private: ic.is_private(),
                    })
                    .collect(),
                container_classes: system
                    .container_classes
                    .iter()
                    .map(|cc| ContainerClassDocument {
                        name: cc.name.clone(),
                        cores: cc.cores.clone(),
                        mem: cc.mem.clone(),
                        app: cc.app.name.clone(),
                        limit: cc.limit,
                    })
                    .collect(),
                performances: system
                    .performances
                    .iter()
                    .map(|entry| PerformanceDocument {
                        instance_class: entry.instance_class.name().to_string(),
                        container_class: entry.container_class.as_ref().map(|cc| cc.name.clone()),
                        app: entry.app.name.clone(),
                        value: entry.performance.value.clone(),
                        slo95: entry.performance.slo95.clone(),
                    })
                    .collect(),
            },
            workloads: problem
                .workloads
                .iter()
                .map(|(app, series)| WorkloadDocument {
                    app: app.name.clone(),
                    description: series.description.clone(),
                    values: series.values.clone(),
                    time_slot_size: series.time_slot_size.clone(),
                    intra_slot_distribution: series.intra_slot_distribution.clone(),
                })
                .collect(),
        })
    }

    pub fn parse(content: &str, format: DocumentFormat) -> ModelResult<Self> {
        Ok(match format {
            DocumentFormat::Json => serde_json::from_str(content)?,
            DocumentFormat::Yaml => serde_yaml::from_str(content)?,
        })
    }

    pub fn render(&self, format: DocumentFormat) -> ModelResult<String> {
        Ok(match format {
            DocumentFormat::Json => serde_json::to_string_pretty(self)?,
            DocumentFormat::Yaml => serde_yaml::to_string(self)?,
        })
    }
}

/// Read a problem file (`.json`, `.yaml` or `.yml`)
pub fn load_problem(path: &Path) -> ModelResult<Problem> {
    let format = DocumentFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let problem = ProblemDocument::parse(&content, format)?.into_problem()?;
    debug!(
        path = %path.display(),
        instance_classes = problem.system.instance_classes.len(),
        workloads = problem.workloads.len(),
        "Loaded problem"
    );
    Ok(problem)
}

/// Write a problem file, the format following the extension
pub fn save_problem(problem: &Problem, path: &Path) -> ModelResult<()> {
    let format = DocumentFormat::from_path(path)?;
    let content = ProblemDocument::from_problem(problem)?.render(format)?;
    fs::write(path, content).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "Saved problem");
    Ok(())
}
