//! CLI command implementations.

pub mod resolve;

use anyhow::{Context, Result};
use cacts_config::ConfigFile;
use cacts_executor::cpu::SLURM_CPU_BIND_LIST;
use cacts_executor::{available_cpu_count, cpu_ids_from_bind_mask};
use std::path::Path;

/// Load a configuration file, adding the path to any error.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    ConfigFile::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

pub fn validate(
    config: &Path,
    root_dir: &Path,
    machine: Option<&str>,
    local_file: Option<&Path>,
) -> Result<()> {
    let file = load_config(config)?;

    let project = file
        .parse_project(root_dir)
        .context("Invalid 'project' section")?;
    let machines = file.machine_specs().context("Invalid 'machines' section")?;
    let builds = file
        .build_specs()
        .context("Invalid 'configurations' section")?;

    println!("Project: {}", project.name);
    println!("Machines: {}", machines.available());
    println!("Build types: {}", builds.available());

    if let Some(name) = machine {
        let machine = file
            .parse_machine_with_local(&project, name, local_file)
            .with_context(|| format!("Failed to resolve machine '{}'", name))?;
        let names: Vec<String> = builds.names().map(str::to_string).collect();
        let resolved = file
            .parse_builds(&project, &machine, false, Some(&names))
            .with_context(|| format!("Failed to resolve build types on '{}'", machine.name))?;
        println!(
            "Resolved {} build type(s) on machine '{}'",
            resolved.len(),
            machine.name
        );
    }

    println!("Configuration is valid");
    Ok(())
}

pub fn cpus(logical: bool) -> Result<()> {
    let count = available_cpu_count(logical).context("Failed to count available CPUs")?;
    println!("{}", count);

    if let Ok(mask) = std::env::var(SLURM_CPU_BIND_LIST) {
        let ids = cpu_ids_from_bind_mask(&mask)
            .with_context(|| format!("Invalid {} value '{}'", SLURM_CPU_BIND_LIST, mask))?;
        let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        println!("bound cpus: {}", ids.join(","));
    }
    Ok(())
}
