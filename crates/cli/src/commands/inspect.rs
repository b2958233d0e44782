//! Problem file inspection commands

use anyhow::{bail, Context, Result};
use cloudmodel::{load_problem, Problem, ProblemDocument};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::output::{
    format_magnitude, or_dash, print_serialized, print_success, print_table, print_warning,
    OutputFormat,
};

/// Row for instance classes table
#[derive(Tabled)]
struct InstanceClassRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Cores")]
    cores: String,
    #[tabled(rename = "Memory")]
    mem: String,
    #[tabled(rename = "Limit")]
    limit: String,
    #[tabled(rename = "Limiting sets")]
    limiting_sets: String,
    #[tabled(rename = "Reserved")]
    reserved: String,
}

/// Row for container classes table
#[derive(Tabled)]
struct ContainerClassRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Cores")]
    cores: String,
    #[tabled(rename = "Memory")]
    mem: String,
    #[tabled(rename = "Limit")]
    limit: String,
}

/// Row for performances table
#[derive(Tabled)]
struct PerformanceRow {
    #[tabled(rename = "Instance class")]
    instance_class: String,
    #[tabled(rename = "Container class")]
    container_class: String,
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Performance")]
    value: String,
    #[tabled(rename = "SLO 95%")]
    slo95: String,
}

/// Row for workloads table
#[derive(Tabled)]
struct WorkloadRow {
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Slot")]
    time_slot_size: String,
    #[tabled(rename = "Slots")]
    slots: usize,
    #[tabled(rename = "Peak")]
    peak: String,
    #[tabled(rename = "Distribution")]
    distribution: String,
}

/// Outcome of `check`
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub file: String,
    pub problem: String,
    pub consistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn load(file: &Path) -> Result<Problem> {
    load_problem(file).with_context(|| format!("Failed to load problem from {}", file.display()))
}

pub fn check_report(file: &Path) -> Result<CheckReport> {
    let problem = load(file)?;
    let error = problem.validate().err().map(|e| e.to_string());
    Ok(CheckReport {
        file: file.display().to_string(),
        problem: problem.name,
        consistent: error.is_none(),
        error,
    })
}

/// Load a problem and run its consistency check
pub fn check(file: &Path, format: OutputFormat) -> Result<()> {
    let report = check_report(file)?;
    match format {
        OutputFormat::Table => {
            if report.consistent {
                print_success(&format!("Problem '{}' is consistent", report.problem));
            } else {
                print_warning(&format!("Problem '{}' is inconsistent", report.problem));
            }
        }
        _ => print_serialized(&report, format)?,
    }

    match report.error {
        Some(error) => bail!("{}", error),
        None => Ok(()),
    }
}

/// Print the contents of a problem file
pub fn show(file: &Path, format: OutputFormat) -> Result<()> {
    let problem = load(file)?;
    if format != OutputFormat::Table {
        let doc = ProblemDocument::from_problem(&problem)?;
        return print_serialized(&doc, format);
    }

    println!(
        "{} {} (version {})",
        "Problem".bold(),
        problem.name.cyan(),
        problem.version
    );
    println!("System:              {}", problem.system.name);
    println!("Scheduling window:   {}", problem.sched_time_size);
    println!();

    let system = &problem.system;
    print_table(
        "Instance classes",
        system
            .instance_classes
            .iter()
            .map(|ic| InstanceClassRow {
                name: ic.name().to_string(),
                price: ic.price().to_string(),
                cores: ic.cores().to_string(),
                mem: ic.mem().to_string(),
                limit: or_dash(ic.limit()),
                limiting_sets: ic
                    .limiting_sets()
                    .iter()
                    .map(|ls| ls.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                reserved: if ic.is_reserved() { "yes" } else { "no" }.to_string(),
            })
            .collect(),
    );
    println!();

    print_table(
        "Container classes",
        system
            .container_classes
            .iter()
            .map(|cc| ContainerClassRow {
                name: cc.name.clone(),
                app: cc.app.name.clone(),
                cores: cc.cores.to_string(),
                mem: cc.mem.to_string(),
                limit: or_dash(cc.limit),
            })
            .collect(),
    );
    println!();

    print_table(
        "Performances",
        system
            .performances
            .iter()
            .map(|entry| PerformanceRow {
                instance_class: entry.instance_class.name().to_string(),
                container_class: or_dash(entry.container_class.as_ref().map(|cc| &cc.name)),
                app: entry.app.name.clone(),
                value: entry.performance.value.to_string(),
                slo95: or_dash(entry.performance.slo95.as_ref()),
            })
            .collect(),
    );
    println!();

    print_table(
        "Workloads",
        problem
            .workloads
            .iter()
            .map(|(app, series)| WorkloadRow {
                app: app.name.clone(),
                description: series.description.clone(),
                time_slot_size: series.time_slot_size.to_string(),
                slots: series.values.len(),
                peak: series
                    .values
                    .iter()
                    .map(|v| v.magnitude())
                    .reduce(f64::max)
                    .map(format_magnitude)
                    .unwrap_or_else(|| "-".to_string()),
                distribution: series.intra_slot_distribution.clone(),
            })
            .collect(),
    );

    Ok(())
}
