//! Configuration file loading.
//!
//! A configuration file is a YAML document with three sections:
//!
//! ```yaml
//! project:
//!   name: MyProject
//! machines:
//!   default: {num_run_res: 4}
//!   laptop: {num_bld_res: 8}
//! configurations:
//!   default: {cmake_args: {CMAKE_BUILD_TYPE: Release}}
//!   dbg: {cmake_args: {CMAKE_BUILD_TYPE: Debug}}
//! ```
//!
//! The `local` machine may also be defined in `~/.cime/cacts.yaml`, whose
//! `machines` section is overlaid on the file's.

use crate::build_type::resolve_build_type;
use crate::machine::resolve_machine;
use crate::project::parse_project;
use crate::schema::{RawBuildSpecs, RawMachineSpecs};
use crate::{ConfigError, ConfigResult, expect};
use cacts_core::machine::LOCAL_MACHINE;
use cacts_core::{BuildType, Machine, Project};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Location of the user-local machine file, relative to the home directory.
pub const LOCAL_MACHINE_FILE: &str = ".cime/cacts.yaml";

pub const PROJECT_SECTION: &str = "project";
pub const MACHINES_SECTION: &str = "machines";
pub const CONFIGURATIONS_SECTION: &str = "configurations";

/// Path of the user-local machine file.
pub fn local_machine_file() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Expectation(
            "cannot locate the home directory to read the 'local' machine definition".to_string(),
        )
    })?;
    Ok(home.join(LOCAL_MACHINE_FILE))
}

/// A loaded configuration document.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    origin: String,
    root: Mapping,
}

/// Everything resolved from one configuration file.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub project: Project,
    pub machine: Machine,
    pub builds: Vec<BuildType>,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, path.display().to_string())
    }

    /// Parse configuration text. `origin` names the source in messages.
    pub fn parse(content: &str, origin: impl Into<String>) -> ConfigResult<Self> {
        let origin = origin.into();
        let value: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            origin: origin.clone(),
            source,
        })?;

        expect(
            value.is_mapping(),
            format!(
                "configuration file {} must contain a mapping at the top level (found {})",
                origin,
                crate::schema::type_name(&value)
            ),
        )?;
        let Value::Mapping(root) = value else {
            return Err(ConfigError::Internal(format!("{} lost its mapping", origin)));
        };
        Ok(Self { origin, root })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Top-level section names, in file order.
    pub fn sections(&self) -> Vec<String> {
        self.root
            .keys()
            .map(|k| match k.as_str() {
                Some(s) => s.to_string(),
                None => crate::schema::describe(k),
            })
            .collect()
    }

    pub fn section(&self, name: &str) -> ConfigResult<&Value> {
        self.root
            .get(name)
            .ok_or_else(|| ConfigError::MissingSection {
                section: name.to_string(),
                origin: self.origin.clone(),
                found: self.sections().join(","),
            })
    }

    pub fn machine_specs(&self) -> ConfigResult<RawMachineSpecs> {
        RawMachineSpecs::parse(self.section(MACHINES_SECTION)?)
    }

    pub fn build_specs(&self) -> ConfigResult<RawBuildSpecs> {
        RawBuildSpecs::parse(self.section(CONFIGURATIONS_SECTION)?)
    }

    /// Resolve the `project` section.
    pub fn parse_project(&self, root_dir: impl Into<PathBuf>) -> ConfigResult<Project> {
        parse_project(self.section(PROJECT_SECTION)?, root_dir)
    }

    /// Resolve machine `name`. `local` reads the user-local machine file.
    pub fn parse_machine(&self, project: &Project, name: &str) -> ConfigResult<Machine> {
        self.parse_machine_with_local(project, name, None)
    }

    /// Resolve machine `name`, reading `local` overrides from `local_file`
    /// (or the default location when `None`).
    pub fn parse_machine_with_local(
        &self,
        project: &Project,
        name: &str,
        local_file: Option<&Path>,
    ) -> ConfigResult<Machine> {
        let mut specs = self.machine_specs()?;

        if name == LOCAL_MACHINE {
            let path = match local_file {
                Some(path) => path.to_path_buf(),
                None => local_machine_file()?,
            };
            info!(path = %path.display(), "Reading local machine definitions");
            let local = ConfigFile::load(&path)?;
            specs.merge(local.machine_specs()?);
        }

        resolve_machine(name, project, &specs)
    }

    /// Resolve the build types to run.
    ///
    /// With `build_types`, exactly those builds are resolved. Otherwise every
    /// build with `on_by_default` is, in file order. When `generate` is set,
    /// builds that do not use baselines are dropped.
    pub fn parse_builds(
        &self,
        project: &Project,
        machine: &Machine,
        generate: bool,
        build_types: Option<&[String]>,
    ) -> ConfigResult<Vec<BuildType>> {
        let specs = self.build_specs()?;
        let mut builds = Vec::new();

        match build_types {
            Some(names) => {
                for name in names {
                    let build = resolve_build_type(name, project, machine, &specs)?;
                    if !generate || build.uses_baselines {
                        builds.push(build);
                    } else {
                        debug!(build = %build.name, "Skipping build without baselines");
                    }
                }
            }
            None => {
                for name in specs.names() {
                    let build = resolve_build_type(name, project, machine, &specs)?;
                    if (!generate || build.uses_baselines) && build.on_by_default {
                        builds.push(build);
                    } else {
                        debug!(build = %build.name, "Skipping build");
                    }
                }
            }
        }

        Ok(builds)
    }

    /// Resolve project, machine and builds in one go.
    pub fn resolve(
        &self,
        root_dir: impl Into<PathBuf>,
        machine_name: &str,
        generate: bool,
        build_types: Option<&[String]>,
    ) -> ConfigResult<ResolvedConfig> {
        let project = self.parse_project(root_dir)?;
        let machine = self.parse_machine(&project, machine_name)?;
        let builds = self.parse_builds(&project, &machine, generate, build_types)?;
        Ok(ResolvedConfig {
            project,
            machine,
            builds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONFIG: &str = r#"
project:
  name: Foo
  baselines_summary_file: baselines.txt

machines:
  default:
    num_bld_res: 4
    num_run_res: 4
  test_machine:
    num_bld_res: 2

configurations:
  default:
    cmake_args:
      CMAKE_BUILD_TYPE: Release
  dbg:
    longname: "${project.name}_debug"
    cmake_args:
      CMAKE_BUILD_TYPE: Debug
  sp:
    uses_baselines: false
  fpe:
    on_by_default: false
    description: "$(echo floating point)"
"#;

    fn config() -> ConfigFile {
        ConfigFile::parse(CONFIG, "cacts.yaml").unwrap()
    }

    fn names(builds: &[BuildType]) -> Vec<&str> {
        builds.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let config = ConfigFile::load(file.path()).unwrap();
        assert_eq!(config.sections(), vec!["project", "machines", "configurations"]);
        assert_eq!(config.origin(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigFile::load("/definitely/not/here/cacts.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ConfigFile::parse("project: [unclosed", "bad.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_root_must_be_mapping() {
        let err = ConfigFile::parse("- a\n- b\n", "list.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Expectation(_)));
        assert!(!err.is_internal());
        assert!(err.to_string().contains("list.yaml must contain a mapping"));
    }

    #[test]
    fn test_missing_section_lists_found() {
        let config = ConfigFile::parse("project: {name: Foo}\nextra: 1\n", "partial.yaml").unwrap();
        let err = config.machine_specs().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("missing 'machines' section"));
        assert!(text.contains("partial.yaml"));
        assert!(text.contains("project,extra"));
    }

    #[test]
    fn test_parse_machine() {
        let config = config();
        let project = config.parse_project("/src/foo").unwrap();
        let machine = config.parse_machine(&project, "test_machine").unwrap();
        assert_eq!(machine.num_bld_res, 2);
        assert_eq!(machine.num_run_res, 4);
    }

    #[test]
    fn test_local_machine_overlay() {
        let mut local = tempfile::NamedTempFile::new().unwrap();
        local
            .write_all(b"machines:\n  local:\n    num_bld_res: 12\n    gpu_arch: HOPPER90\n")
            .unwrap();

        let config = config();
        let project = config.parse_project("/src/foo").unwrap();
        let machine = config
            .parse_machine_with_local(&project, "local", Some(local.path()))
            .unwrap();
        assert_eq!(machine.name, "local");
        assert_eq!(machine.num_bld_res, 12);
        assert_eq!(machine.num_run_res, 4);
        assert_eq!(machine.gpu_arch.as_deref(), Some("HOPPER90"));
    }

    #[test]
    fn test_local_machine_file_missing() {
        let config = config();
        let project = config.parse_project("/src/foo").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = config
            .parse_machine_with_local(&project, "local", Some(&dir.path().join("cacts.yaml")))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_local_machine_file_location() {
        if let Ok(path) = local_machine_file() {
            assert!(path.ends_with(".cime/cacts.yaml"));
        }
    }

    #[test]
    fn test_default_builds() {
        let resolved = config().resolve("/src/foo", "test_machine", false, None).unwrap();
        assert_eq!(names(&resolved.builds), vec!["dbg", "sp"]);

        let dbg = &resolved.builds[0];
        assert_eq!(dbg.longname, "Foo_debug");
        assert_eq!(dbg.cmake_args["CMAKE_BUILD_TYPE"], "Debug");
        assert_eq!(resolved.builds[1].cmake_args["CMAKE_BUILD_TYPE"], "Release");
    }

    #[test]
    fn test_generate_skips_builds_without_baselines() {
        let resolved = config().resolve("/src/foo", "test_machine", true, None).unwrap();
        assert_eq!(names(&resolved.builds), vec!["dbg"]);
    }

    #[test]
    fn test_explicit_build_list() {
        let wanted = vec!["fpe".to_string(), "sp".to_string()];
        let resolved = config()
            .resolve("/src/foo", "test_machine", false, Some(&wanted))
            .unwrap();
        assert_eq!(names(&resolved.builds), vec!["fpe", "sp"]);
        assert_eq!(resolved.builds[0].description.as_deref(), Some("floating point"));

        let resolved = config()
            .resolve("/src/foo", "test_machine", true, Some(&wanted))
            .unwrap();
        assert_eq!(names(&resolved.builds), vec!["fpe"]);
    }

    #[test]
    fn test_unknown_build_in_list() {
        let wanted = vec!["opt".to_string()];
        let err = config()
            .resolve("/src/foo", "test_machine", false, Some(&wanted))
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("build type 'opt' not found"));
        assert!(text.contains("dbg,sp,fpe"));
    }

    #[test]
    fn test_resolved_config_serializes() {
        let resolved = config().resolve("/src/foo", "test_machine", false, None).unwrap();
        let json = serde_json::to_value(&resolved).unwrap();
        assert_eq!(json["project"]["name"], "Foo");
        assert_eq!(json["machine"]["num_bld_res"], 2);
        assert_eq!(json["builds"][0]["longname"], "Foo_debug");
    }
}
