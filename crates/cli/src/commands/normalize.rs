//! Time-unit normalization command

use anyhow::{Context, Result};
use cloudmodel::{load_problem, normalize_time_units, save_problem, ProblemDocument};
use std::path::Path;
use tracing::info;

use crate::output::{print_serialized, print_success, OutputFormat};

/// Normalize a problem file to `unit` and write it to `output` or stdout.
///
/// On stdout the document is printed as YAML unless JSON is requested.
pub fn normalize(file: &Path, unit: &str, output: Option<&Path>, format: OutputFormat) -> Result<()> {
    let problem = load_problem(file)
        .with_context(|| format!("Failed to load problem from {}", file.display()))?;
    let normalized = normalize_time_units(&problem, unit)
        .with_context(|| format!("Cannot normalize '{}' to '{}'", problem.name, unit))?;
    info!(problem = %normalized.name, unit, "Normalized problem");

    match output {
        Some(path) => {
            save_problem(&normalized, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!(
                "Wrote '{}' in {} to {}",
                normalized.name,
                unit,
                path.display()
            ));
        }
        None => {
            let doc = ProblemDocument::from_problem(&normalized)?;
            let format = match format {
                OutputFormat::Json => OutputFormat::Json,
                _ => OutputFormat::Yaml,
            };
            print_serialized(&doc, format)?;
        }
    }

    Ok(())
}
