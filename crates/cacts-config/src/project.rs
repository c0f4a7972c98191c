//! Project resolution.

use crate::commands::evaluate_commands;
use crate::schema::RawProject;
use crate::{ConfigError, ConfigResult, expect_with};
use cacts_core::Project;
use serde_yaml::Value;
use std::path::PathBuf;
use tracing::debug;

/// Parse and resolve the `project` section.
pub fn parse_project(value: &Value, root_dir: impl Into<PathBuf>) -> ConfigResult<Project> {
    let spec = RawProject::parse(value)?;
    resolve_project(&spec, root_dir)
}

/// Build a [`Project`] from a validated spec and evaluate its `$(...)`
/// substitutions.
pub fn resolve_project(spec: &RawProject, root_dir: impl Into<PathBuf>) -> ConfigResult<Project> {
    check_name(&spec.name)?;

    let mut project = Project {
        name: spec.name.clone(),
        baselines_gen_label: spec.baselines_gen_label.clone(),
        baselines_cmp_label: spec.baselines_cmp_label.clone(),
        baselines_summary_file: spec.baselines_summary_file.clone(),
        enable_baselines_cmake_option: spec.enable_baselines_cmake_option.clone(),
        cmake_vars_names: spec.cmake_vars_names.clone().unwrap_or_default(),
        cdash: spec.cdash.clone().unwrap_or_default(),
        root_dir: root_dir.into(),
    };

    evaluate_commands(&mut project)?;
    check_name(&project.name)?;

    debug!(project = %project.name, root_dir = %project.root_dir.display(), "Resolved project");
    Ok(project)
}

fn check_name(name: &str) -> ConfigResult<()> {
    expect_with(!name.trim().is_empty(), || ConfigError::InvalidValue {
        entity: "project".to_string(),
        field: "name".to_string(),
        message: format!("must not be empty (got {:?})", name),
    })
}
