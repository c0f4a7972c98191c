//! Build type resolution.

use crate::commands::evaluate_commands;
use crate::schema::{DEFAULT_ENTRY, RawBuildSpecs};
use crate::variables::{Namespace, expand_record};
use crate::{ConfigError, ConfigResult, expect_with};
use cacts_core::{BuildType, Machine, Project};
use tracing::info;

/// Resolve build type `name` against the `configurations` specs.
///
/// `uses_baselines` and `on_by_default` take the named entry's value, then
/// the `default` entry's, then `true`. An explicit `false` always wins over
/// the layer below it. `cmake_args` is the default mapping updated by the
/// named one. References may point at `project`, `machine` and `build`;
/// `build` fields are expanded in declaration order, so a field sees the
/// expanded values of the fields before it.
pub fn resolve_build_type(
    name: &str,
    project: &Project,
    machine: &Machine,
    specs: &RawBuildSpecs,
) -> ConfigResult<BuildType> {
    expect_with(name != DEFAULT_ENTRY && specs.contains(name), || {
        ConfigError::UnknownEntry {
            kind: "build type".to_string(),
            name: name.to_string(),
            section: specs.section().to_string(),
            available: specs.available(),
        }
    })?;

    let props = specs.get(name).cloned().unwrap_or_default();
    let default = specs.default_entry();

    let mut cmake_args = default.cmake_args.clone().unwrap_or_default();
    cmake_args.extend(props.cmake_args.unwrap_or_default());

    let mut build = BuildType {
        name: name.to_string(),
        longname: props.longname.unwrap_or_else(|| name.to_string()),
        description: props.description,
        uses_baselines: props
            .uses_baselines
            .or(default.uses_baselines)
            .unwrap_or(true),
        on_by_default: props.on_by_default.or(default.on_by_default).unwrap_or(true),
        cmake_args,
        compile_res_count: None,
        testing_res_count: None,
        baselines_missing: false,
    };

    let mut namespace = Namespace::new()
        .with("project", project)?
        .with("machine", machine)?;
    expand_record(&mut build, "build", &mut namespace)?;
    evaluate_commands(&mut build)?;

    info!(
        build = %build.name,
        longname = %build.longname,
        uses_baselines = build.uses_baselines,
        on_by_default = build.on_by_default,
        "Resolved build type"
    );
    Ok(build)
}
