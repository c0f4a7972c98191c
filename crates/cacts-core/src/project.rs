//! Project definition.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Identity and global policy for the body of work under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project name. Never empty once resolved.
    pub name: String,
    /// Test label to run when generating baselines. `None` runs every test.
    pub baselines_gen_label: Option<String>,
    /// Test label to run when comparing against baselines.
    pub baselines_cmp_label: Option<String>,
    /// File (relative to the cmake build dir) listing the baseline files
    /// that must be copied once every baseline test has succeeded.
    pub baselines_summary_file: Option<String>,
    /// CMake option that turns baseline tests on or off.
    pub enable_baselines_cmake_option: Option<String>,
    /// Names of project cmake variables the driver sets on the project's behalf.
    pub cmake_vars_names: BTreeMap<String, String>,
    /// CDash submission settings.
    pub cdash: BTreeMap<String, String>,
    /// Root of the project source tree. Supplied by the caller.
    #[serde(serialize_with = "serialize_path_lossy")]
    pub root_dir: PathBuf,
}

impl Project {
    /// Look up a project cmake variable name, e.g. `enable_baselines`.
    pub fn cmake_var_name(&self, key: &str) -> Option<&str> {
        self.cmake_vars_names.get(key).map(String::as_str)
    }

    /// Whether the project can switch baseline tests on and off through cmake.
    pub fn can_toggle_baselines(&self) -> bool {
        self.enable_baselines_cmake_option.is_some()
    }
}

/// Paths that are not valid UTF-8 serialize with replacement characters.
fn serialize_path_lossy<P, S>(path: &P, serializer: S) -> Result<S::Ok, S::Error>
where
    P: AsRef<Path>,
    S: Serializer,
{
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            name: "TestProject".to_string(),
            baselines_gen_label: Some("gen_label".to_string()),
            baselines_cmp_label: None,
            baselines_summary_file: None,
            enable_baselines_cmake_option: None,
            cmake_vars_names: BTreeMap::from([(
                "enable_baselines".to_string(),
                "PROJ_ENABLE_BASELINES".to_string(),
            )]),
            cdash: BTreeMap::new(),
            root_dir: PathBuf::from("/path/to/root"),
        }
    }

    #[test]
    fn test_cmake_var_name() {
        let project = project();
        assert_eq!(
            project.cmake_var_name("enable_baselines"),
            Some("PROJ_ENABLE_BASELINES")
        );
        assert_eq!(project.cmake_var_name("missing"), None);
    }

    #[test]
    fn test_can_toggle_baselines() {
        let mut project = project();
        assert!(!project.can_toggle_baselines());

        project.enable_baselines_cmake_option = Some("PROJ_ENABLE_BASELINES".to_string());
        assert!(project.can_toggle_baselines());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(project()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object["name"], "TestProject");
        assert_eq!(object["baselines_gen_label"], "gen_label");
        assert!(object["baselines_cmp_label"].is_null());
        assert_eq!(object["root_dir"], "/path/to/root");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_root_dir_serializes_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut project = project();
        project.root_dir = PathBuf::from(OsStr::from_bytes(b"/src/\xff"));
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["root_dir"], "/src/\u{fffd}");
    }
}
