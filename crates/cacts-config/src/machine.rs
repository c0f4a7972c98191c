//! Machine resolution.

use crate::commands::evaluate_commands;
use crate::schema::{DEFAULT_ENTRY, RawMachineSpecs};
use crate::variables::{Namespace, expand_record};
use crate::{ConfigError, ConfigResult, expect_with};
use cacts_core::{Machine, Project};
use cacts_executor::available_cpu_count;
use tracing::{debug, info};

/// Resolve machine `name` against the `machines` specs.
///
/// Resource counts come from the named entry, then the `default` entry, then
/// the number of logical CPUs available to this process. `env_setup` and
/// `gpu_arch` fall back to the `default` entry. Afterwards `${project.*}` and
/// `${machine.*}` references are expanded field by field, so a field sees the
/// expanded values of the fields declared before it, then `$(...)` commands.
pub fn resolve_machine(
    name: &str,
    project: &Project,
    specs: &RawMachineSpecs,
) -> ConfigResult<Machine> {
    expect_with(name != DEFAULT_ENTRY && specs.contains(name), || {
        ConfigError::UnknownEntry {
            kind: "machine".to_string(),
            name: name.to_string(),
            section: specs.section().to_string(),
            available: specs.available(),
        }
    })?;

    let props = specs.get(name).cloned().unwrap_or_default();
    let default = specs.default_entry();

    let num_bld_res = match props.num_bld_res.or(default.num_bld_res) {
        Some(n) => n,
        None => cpu_fallback()?,
    };
    let num_run_res = match props.num_run_res.or(default.num_run_res) {
        Some(n) => n,
        None => cpu_fallback()?,
    };

    let mut machine = Machine {
        name: name.to_string(),
        num_bld_res,
        num_run_res,
        env_setup: props
            .env_setup
            .or_else(|| default.env_setup.clone())
            .unwrap_or_default(),
        gpu_arch: props.gpu_arch.or_else(|| default.gpu_arch.clone()),
    };

    let mut namespace = Namespace::new().with("project", project)?;
    expand_record(&mut machine, "machine", &mut namespace)?;
    evaluate_commands(&mut machine)?;

    info!(
        machine = %machine.name,
        num_bld_res = machine.num_bld_res,
        num_run_res = machine.num_run_res,
        gpu = machine.uses_gpu(),
        "Resolved machine"
    );
    Ok(machine)
}

fn cpu_fallback() -> ConfigResult<u32> {
    let count = available_cpu_count(true)?;
    debug!(count, "Falling back to available cpu count");
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}
