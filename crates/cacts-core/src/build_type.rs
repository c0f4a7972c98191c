//! Build type (build/test variant) definition.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named build/test variant of the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildType {
    pub name: String,
    /// Human readable name. Defaults to `name`.
    pub longname: String,
    pub description: Option<String>,
    /// Whether this variant generates and compares baselines.
    pub uses_baselines: bool,
    /// Whether this variant runs when no explicit variant list is given.
    pub on_by_default: bool,
    /// Cmake cache entries, flag name to value.
    pub cmake_args: BTreeMap<String, String>,

    // Set at runtime by the driver, never by configuration.
    pub compile_res_count: Option<u32>,
    pub testing_res_count: Option<u32>,
    pub baselines_missing: bool,
}

impl BuildType {
    /// Render `cmake_args` as `-DKEY=VALUE` arguments, in key order.
    pub fn cmake_cache_args(&self) -> Vec<String> {
        self.cmake_args
            .iter()
            .map(|(key, value)| format!("-D{}={}", key, value))
            .collect()
    }

    /// Whether baselines should be generated for this variant.
    pub fn needs_baselines(&self) -> bool {
        self.uses_baselines && self.baselines_missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build() -> BuildType {
        BuildType {
            name: "dbg".to_string(),
            longname: "debug".to_string(),
            description: None,
            uses_baselines: true,
            on_by_default: true,
            cmake_args: BTreeMap::from([
                ("CMAKE_BUILD_TYPE".to_string(), "Debug".to_string()),
                ("BUILD_SHARED_LIBS".to_string(), "ON".to_string()),
            ]),
            compile_res_count: None,
            testing_res_count: None,
            baselines_missing: false,
        }
    }

    #[test]
    fn test_cmake_cache_args() {
        assert_eq!(
            build().cmake_cache_args(),
            vec!["-DBUILD_SHARED_LIBS=ON", "-DCMAKE_BUILD_TYPE=Debug"]
        );
    }

    #[test]
    fn test_needs_baselines() {
        let mut build = build();
        assert!(!build.needs_baselines());
        build.baselines_missing = true;
        assert!(build.needs_baselines());
        build.uses_baselines = false;
        assert!(!build.needs_baselines());
    }
}
