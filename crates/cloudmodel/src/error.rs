//! Errors for problem descriptions and problem files

use crate::units::UnitError;
use std::path::PathBuf;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    // ---- consistency ----
    #[error("instance class '{0}' is in the performance table but not in the system")]
    UnlistedInstanceClass(String),

    #[error("container class '{0}' is in the performance table but not in the system")]
    UnlistedContainerClass(String),

    #[error("workload for app '{0}' has no entry in the performance table")]
    WorkloadWithoutPerformance(String),

    #[error("container class '{container}' runs app '{app}' which has no entry in the performance table")]
    ContainerAppWithoutPerformance { container: String, app: String },

    // ---- problem documents ----
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("unknown {kind} '{name}' referenced by {referrer}")]
    UnknownReference {
        kind: &'static str,
        name: String,
        referrer: String,
    },

    #[error("unsupported problem file extension for {0} (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON problem document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML problem document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Unit(#[from] UnitError),
}
