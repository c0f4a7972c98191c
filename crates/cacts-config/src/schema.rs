//! Typed intermediate specs for the `project`, `machines` and
//! `configurations` sections.
//!
//! Raw YAML is checked field by field against the known schema before any
//! entity is built. Every problem in a section is collected and reported in
//! a single [`ConfigError::Schema`]. Unknown keys are ignored and `null`
//! values count as absent.

use crate::{ConfigError, ConfigResult, SchemaIssue};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Name of the entry that supplies fallback values in `machines` and
/// `configurations`.
pub const DEFAULT_ENTRY: &str = "default";

/// Validated `project` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProject {
    pub name: String,
    pub baselines_gen_label: Option<String>,
    pub baselines_cmp_label: Option<String>,
    pub baselines_summary_file: Option<String>,
    pub enable_baselines_cmake_option: Option<String>,
    pub cmake_vars_names: Option<BTreeMap<String, String>>,
    pub cdash: Option<BTreeMap<String, String>>,
}

impl RawProject {
    pub fn parse(value: &Value) -> ConfigResult<Self> {
        let mut issues = Vec::new();
        let project = match value.as_mapping() {
            Some(map) => {
                let mut fields = Fields::new("project", map, &mut issues);
                let name = fields.required_string("name");
                let project = RawProject {
                    name: name.clone().unwrap_or_default(),
                    baselines_gen_label: fields
                        .string_any(&["baselines_gen_label", "baseline_gen_label"]),
                    baselines_cmp_label: fields
                        .string_any(&["baselines_cmp_label", "baseline_cmp_label"]),
                    baselines_summary_file: fields
                        .string_any(&["baselines_summary_file", "baseline_summary_file"]),
                    enable_baselines_cmake_option: fields.string("enable_baselines_cmake_option"),
                    cmake_vars_names: fields.scalar_map("cmake_vars_names"),
                    cdash: fields.scalar_map("cdash"),
                };
                if matches!(name.as_deref(), Some(n) if n.trim().is_empty()) {
                    fields.issue("name", "must not be empty");
                }
                project
            }
            None => {
                issues.push(SchemaIssue {
                    entry: "project".to_string(),
                    field: String::new(),
                    message: format!("expected a mapping, found {}", describe(value)),
                });
                RawProject::default()
            }
        };
        finish("project", issues, project)
    }
}

/// Validated entry of the `machines` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMachine {
    pub num_bld_res: Option<u32>,
    pub num_run_res: Option<u32>,
    pub env_setup: Option<Vec<String>>,
    pub gpu_arch: Option<String>,
}

impl RawMachine {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        RawMachine {
            num_bld_res: fields.count("num_bld_res"),
            num_run_res: fields.count("num_run_res"),
            env_setup: fields.strings("env_setup"),
            gpu_arch: fields.string("gpu_arch"),
        }
    }
}

/// Validated entry of the `configurations` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBuildType {
    pub longname: Option<String>,
    pub description: Option<String>,
    pub uses_baselines: Option<bool>,
    pub on_by_default: Option<bool>,
    pub cmake_args: Option<BTreeMap<String, String>>,
}

impl RawBuildType {
    fn from_fields(fields: &mut Fields<'_>) -> Self {
        RawBuildType {
            longname: fields.string("longname"),
            description: fields.string("description"),
            uses_baselines: fields.bool("uses_baselines"),
            on_by_default: fields.bool("on_by_default"),
            cmake_args: fields.scalar_map("cmake_args"),
        }
    }
}

/// Named entries of a section plus its `default` entry, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySpecs<T> {
    section: String,
    default: T,
    has_default: bool,
    entries: Vec<(String, T)>,
}

pub type RawMachineSpecs = EntrySpecs<RawMachine>;
pub type RawBuildSpecs = EntrySpecs<RawBuildType>;

impl RawMachineSpecs {
    pub fn parse(value: &Value) -> ConfigResult<Self> {
        parse_entries("machines", value, RawMachine::from_fields)
    }
}

impl RawBuildSpecs {
    pub fn parse(value: &Value) -> ConfigResult<Self> {
        parse_entries("configurations", value, RawBuildType::from_fields)
    }
}

impl<T: Default> EntrySpecs<T> {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            default: T::default(),
            has_default: false,
            entries: Vec::new(),
        }
    }

    /// Add or replace an entry. `default` replaces the default layer.
    pub fn insert(&mut self, name: impl Into<String>, entry: T) {
        let name = name.into();
        if name == DEFAULT_ENTRY {
            self.default = entry;
            self.has_default = true;
        } else if let Some(slot) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = entry;
        } else {
            self.entries.push((name, entry));
        }
    }

    /// Overlay `other` on top of `self`, replacing same-named entries whole.
    pub fn merge(&mut self, other: EntrySpecs<T>) {
        if other.has_default {
            self.insert(DEFAULT_ENTRY, other.default);
        }
        for (name, entry) in other.entries {
            self.insert(name, entry);
        }
    }
}

impl<T> EntrySpecs<T> {
    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        if name == DEFAULT_ENTRY {
            return Some(&self.default);
        }
        self.entries.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn contains(&self, name: &str) -> bool {
        (name == DEFAULT_ENTRY && self.has_default) || self.entries.iter().any(|(n, _)| n == name)
    }

    /// The default layer. Empty when the section has no `default` entry.
    pub fn default_entry(&self) -> &T {
        &self.default
    }

    /// Entry names in file order, excluding `default`.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Comma separated entry names, for error messages.
    pub fn available(&self) -> String {
        self.names().collect::<Vec<_>>().join(",")
    }
}

fn parse_entries<T: Default>(
    section: &str,
    value: &Value,
    parse_one: fn(&mut Fields<'_>) -> T,
) -> ConfigResult<EntrySpecs<T>> {
    let mut issues = Vec::new();
    let mut specs = EntrySpecs::new(section);

    match value.as_mapping() {
        Some(map) => {
            for (key, entry) in map {
                let Some(name) = key.as_str() else {
                    issues.push(SchemaIssue {
                        entry: section.to_string(),
                        field: String::new(),
                        message: format!("entry names must be strings, found {}", describe(key)),
                    });
                    continue;
                };
                match entry {
                    Value::Null => specs.insert(name, T::default()),
                    Value::Mapping(fields) => {
                        let parsed = parse_one(&mut Fields::new(name, fields, &mut issues));
                        specs.insert(name, parsed);
                    }
                    other => issues.push(SchemaIssue {
                        entry: name.to_string(),
                        field: String::new(),
                        message: format!("expected a mapping, found {}", describe(other)),
                    }),
                }
            }
        }
        None => issues.push(SchemaIssue {
            entry: section.to_string(),
            field: String::new(),
            message: format!("expected a mapping, found {}", describe(value)),
        }),
    }

    finish(section, issues, specs)
}

fn finish<T>(section: &str, issues: Vec<SchemaIssue>, parsed: T) -> ConfigResult<T> {
    if issues.is_empty() {
        Ok(parsed)
    } else {
        Err(ConfigError::Schema {
            section: section.to_string(),
            issues,
        })
    }
}

/// Typed accessors over one entry, recording an issue for every mismatch.
struct Fields<'a> {
    entry: &'a str,
    map: &'a Mapping,
    issues: &'a mut Vec<SchemaIssue>,
}

impl<'a> Fields<'a> {
    fn new(entry: &'a str, map: &'a Mapping, issues: &'a mut Vec<SchemaIssue>) -> Self {
        Self {
            entry,
            map,
            issues,
        }
    }

    fn issue(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(SchemaIssue {
            entry: self.entry.to_string(),
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn mismatch(&mut self, field: &str, value: &Value, expected: &str) {
        self.issue(
            field,
            format!(
                "invalid value {} (found {}, expected {})",
                describe(value),
                type_name(value),
                expected
            ),
        );
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn required_string(&mut self, key: &str) -> Option<String> {
        if self.get(key).is_none() {
            self.issue(key, "missing required field");
            return None;
        }
        self.string(key)
    }

    fn string(&mut self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        match value.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                self.mismatch(key, value, "string");
                None
            }
        }
    }

    /// First present key wins. Used for accepted spelling variants.
    fn string_any(&mut self, keys: &[&str]) -> Option<String> {
        let key = keys.iter().find(|k| self.get(k).is_some())?;
        self.string(key)
    }

    fn bool(&mut self, key: &str) -> Option<bool> {
        let value = self.get(key)?;
        match value.as_bool() {
            Some(b) => Some(b),
            None => {
                self.mismatch(key, value, "bool");
                None
            }
        }
    }

    /// A resource count: an integer between 1 and `u32::MAX`.
    fn count(&mut self, key: &str) -> Option<u32> {
        let value = self.get(key)?;
        match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
            Some(n) if n >= 1 => Some(n),
            _ => {
                self.mismatch(key, value, "integer >= 1");
                None
            }
        }
    }

    fn strings(&mut self, key: &str) -> Option<Vec<String>> {
        let value = self.get(key)?;
        let Some(items) = value.as_sequence() else {
            self.mismatch(key, value, "sequence of strings");
            return None;
        };
        let mut result = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            match item.as_str() {
                Some(s) => result.push(s.to_string()),
                None => {
                    self.mismatch(&format!("{}[{}]", key, i), item, "string");
                    ok = false;
                }
            }
        }
        ok.then_some(result)
    }

    /// A flat mapping whose keys and values are scalars, stored as text.
    fn scalar_map(&mut self, key: &str) -> Option<BTreeMap<String, String>> {
        let value = self.get(key)?;
        let Some(map) = value.as_mapping() else {
            self.mismatch(key, value, "mapping");
            return None;
        };
        let mut result = BTreeMap::new();
        let mut ok = true;
        for (k, v) in map {
            let Some(name) = scalar_text(k) else {
                self.mismatch(key, k, "scalar key");
                ok = false;
                continue;
            };
            match scalar_text(v) {
                Some(text) => {
                    result.insert(name, text);
                }
                None => {
                    self.mismatch(&format!("{}.{}", key, name), v, "scalar");
                    ok = false;
                }
            }
        }
        ok.then_some(result)
    }
}

/// Text form of a scalar YAML value. `None` for null and compound values.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

/// Short human readable rendering of a value for error messages.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => format!("{:?}", s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Sequence(items) => format!("a sequence of {} items", items.len()),
        Value::Mapping(map) => format!("a mapping with {} keys", map.len()),
        Value::Tagged(tagged) => format!("a value tagged {}", tagged.tag),
    }
}
