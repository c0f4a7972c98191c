//! Attribute reference substitution.
//!
//! Strings may refer to attributes of sibling configuration objects:
//! - `${project.name}` - Project name
//! - `${project.root_dir}` - Project source tree
//! - `${machine.num_bld_res}` - Build resources of the machine
//! - `${machine.gpu_arch}` - GPU architecture (fails if unset)
//! - `${build.longname}` - Any attribute of the build type being resolved
//!
//! Every reference must resolve: unknown objects, unknown attributes and
//! unset attributes are configuration errors. Substituted text is not
//! scanned again.

use crate::walk::{Record, StringPass, Walk};
use crate::{ConfigError, ConfigResult};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

// Regex for matching ${object.attribute} references
static REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\.(\w+)\}").unwrap());

/// Objects available to `${object.attribute}` references.
///
/// Each object is captured as a table of its serialized attributes at the
/// time it is inserted.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    objects: Vec<(String, Map<String, Value>)>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an object under `name`.
    pub fn insert<T: Serialize>(&mut self, name: &str, object: &T) -> ConfigResult<()> {
        let attributes = match serde_json::to_value(object) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(ConfigError::Internal(format!(
                    "object '{}' does not serialize to a record: {}",
                    name, other
                )));
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    entity: name.to_string(),
                    field: "attributes".to_string(),
                    message: format!("cannot be used in references: {}", e),
                });
            }
        };

        match self.objects.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = attributes,
            None => self.objects.push((name.to_string(), attributes)),
        }
        Ok(())
    }

    /// Builder-style [`Namespace::insert`].
    pub fn with<T: Serialize>(mut self, name: &str, object: &T) -> ConfigResult<Self> {
        self.insert(name, object)?;
        Ok(self)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.iter().map(|(n, _)| n.as_str())
    }

    /// Resolve one reference to its text. `original` is the string being
    /// expanded and only feeds error messages.
    pub fn resolve(&self, object: &str, attribute: &str, original: &str) -> ConfigResult<String> {
        let Some((_, attributes)) = self.objects.iter().find(|(n, _)| n == object) else {
            return Err(ConfigError::UnknownObject {
                object: object.to_string(),
                attribute: attribute.to_string(),
                original: original.to_string(),
                valid: self.names().collect::<Vec<_>>().join(", "),
            });
        };

        let Some(value) = attributes.get(attribute) else {
            return Err(ConfigError::UnknownAttribute {
                object: object.to_string(),
                attribute: attribute.to_string(),
                original: original.to_string(),
                available: attributes.keys().cloned().collect::<Vec<_>>().join(", "),
            });
        };

        let text = match value {
            Value::Null => {
                return Err(ConfigError::UnsetAttribute {
                    object: object.to_string(),
                    attribute: attribute.to_string(),
                    original: original.to_string(),
                });
            }
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            compound => serde_json::to_string(compound).map_err(|e| {
                ConfigError::Internal(format!("cannot render {}.{}: {}", object, attribute, e))
            })?,
        };

        // Attributes are expanded in declaration order; a later one is still raw.
        if has_references(&text) {
            return Err(ConfigError::InvalidValue {
                entity: object.to_string(),
                field: attribute.to_string(),
                message: format!(
                    "'{}' is referenced by '{}' before its own references are expanded",
                    text, original
                ),
            });
        }
        Ok(text)
    }

    /// Replace every reference in `input`.
    ///
    /// Returns `None` when `input` contains no reference.
    pub fn interpolate(&self, input: &str) -> ConfigResult<Option<String>> {
        if !REF_REGEX.is_match(input) {
            return Ok(None);
        }

        let mut output = String::with_capacity(input.len());
        let mut last = 0;
        for caps in REF_REGEX.captures_iter(input) {
            let (Some(whole), Some(object), Some(attribute)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            output.push_str(&input[last..whole.start()]);
            output.push_str(&self.resolve(object.as_str(), attribute.as_str(), input)?);
            last = whole.end();
        }
        output.push_str(&input[last..]);

        if REF_REGEX.is_match(&output) {
            return Err(ConfigError::Internal(format!(
                "something went wrong while replacing ${{..}} patterns in string '{}' (result: '{}')",
                input, output
            )));
        }
        Ok(Some(output))
    }
}

impl StringPass for Namespace {
    fn apply(&self, text: &str) -> ConfigResult<Option<String>> {
        self.interpolate(text)
    }
}

/// Whether `input` still contains a `${object.attribute}` reference.
pub fn has_references(input: &str) -> bool {
    REF_REGEX.is_match(input)
}

/// Expand `record` one field at a time, in declaration order, publishing it
/// as `name` in `namespace` before each field so later fields can reference
/// the already expanded ones.
pub fn expand_record<R: Record + Serialize>(
    record: &mut R,
    name: &str,
    namespace: &mut Namespace,
) -> ConfigResult<()> {
    for &field in record.field_names() {
        namespace.insert(name, &*record)?;
        record.walk_field(field, &*namespace)?;
    }
    namespace.insert(name, &*record)
}

/// Resolve every `${object.attribute}` reference reachable from `target`.
pub fn expand_variables<T: Walk + ?Sized>(target: &mut T, namespace: &Namespace) -> ConfigResult<()> {
    target.walk(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Proj {
        name: String,
        label: Option<String>,
        count: u32,
        enabled: bool,
        setup: Vec<String>,
    }

    fn namespace() -> Namespace {
        let project = Proj {
            name: "MockProject".to_string(),
            label: None,
            count: 4,
            enabled: true,
            setup: vec!["a".to_string(), "b".to_string()],
        };
        Namespace::new().with("project", &project).unwrap()
    }

    #[test]
    fn test_basic_interpolation() {
        let ns = namespace();
        let result = ns.interpolate("${project.name}_longname").unwrap();
        assert_eq!(result.as_deref(), Some("MockProject_longname"));
    }

    #[test]
    fn test_multiple_references() {
        let ns = namespace();
        let result = ns
            .interpolate("-j${project.count} ${project.name}/${project.name} ${project.enabled}")
            .unwrap();
        assert_eq!(result.as_deref(), Some("-j4 MockProject/MockProject true"));
    }

    #[test]
    fn test_compound_values_render_as_json() {
        let ns = namespace();
        let result = ns.interpolate("${project.setup}").unwrap();
        assert_eq!(result.as_deref(), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_no_reference_is_unchanged() {
        let ns = namespace();
        assert_eq!(ns.interpolate("plain text $HOME ${NOT_A_REF}").unwrap(), None);
    }

    #[test]
    fn test_idempotent_on_resolved_output() {
        let ns = namespace();
        let once = ns.interpolate("${project.name}-x").unwrap().unwrap();
        assert_eq!(ns.interpolate(&once).unwrap(), None);
    }

    #[test]
    fn test_unknown_object() {
        let ns = namespace();
        let err = ns.interpolate("${machine.name}").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownObject { ref object, .. } if object == "machine"));
        assert!(err.to_string().contains("must be one of project"));
    }

    #[test]
    fn test_unknown_attribute_lists_available() {
        let ns = namespace();
        let err = ns.interpolate("${project.nope}").unwrap_err();
        match &err {
            ConfigError::UnknownAttribute { available, .. } => {
                assert!(available.contains("name"));
                assert!(available.contains("count"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_internal());
    }

    #[test]
    fn test_unset_attribute() {
        let ns = namespace();
        let err = ns.interpolate("label=${project.label}").unwrap_err();
        assert!(matches!(err, ConfigError::UnsetAttribute { .. }));
    }

    #[test]
    fn test_unexpanded_attribute_is_configuration_error() {
        let raw = BTreeMap::from([("name".to_string(), "${project.name}".to_string())]);
        let ns = Namespace::new().with("project", &raw).unwrap();
        let err = ns.interpolate("x ${project.name}").unwrap_err();
        assert!(!err.is_internal());
        match &err {
            ConfigError::InvalidValue { entity, field, .. } => {
                assert_eq!(entity, "project");
                assert_eq!(field, "name");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    fn gpu_machine(env_setup: &[&str]) -> cacts_core::Machine {
        cacts_core::Machine {
            name: "m".to_string(),
            num_bld_res: 2,
            num_run_res: 4,
            env_setup: env_setup.iter().map(|s| s.to_string()).collect(),
            gpu_arch: Some("${machine.name}-gpu".to_string()),
        }
    }

    #[test]
    fn test_expand_record_sees_earlier_fields() {
        let mut machine = gpu_machine(&[]);
        let mut ns = Namespace::new();
        expand_record(&mut machine, "machine", &mut ns).unwrap();
        assert_eq!(machine.gpu_arch.as_deref(), Some("m-gpu"));
        assert_eq!(
            ns.interpolate("${machine.gpu_arch}").unwrap().as_deref(),
            Some("m-gpu")
        );
    }

    #[test]
    fn test_expand_record_forward_reference_fails() {
        // env_setup is declared before gpu_arch.
        let mut machine = gpu_machine(&["export ARCH=${machine.gpu_arch}"]);
        let err = expand_record(&mut machine, "machine", &mut Namespace::new()).unwrap_err();
        assert!(!err.is_internal());
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "gpu_arch"));
    }

    #[test]
    fn test_insert_replaces_object() {
        let mut ns = namespace();
        let other = BTreeMap::from([("name".to_string(), "Other".to_string())]);
        ns.insert("project", &other).unwrap();
        assert_eq!(ns.names().collect::<Vec<_>>(), vec!["project"]);
        assert_eq!(
            ns.interpolate("${project.name}").unwrap().as_deref(),
            Some("Other")
        );
    }

    #[test]
    fn test_non_record_object_rejected() {
        let err = Namespace::new().with("project", &"just a string").unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_expand_variables_over_graph() {
        let ns = namespace();
        let mut args = BTreeMap::from([
            ("NAME".to_string(), "${project.name}".to_string()),
            ("JOBS".to_string(), "${project.count}".to_string()),
        ]);
        expand_variables(&mut args, &ns).unwrap();
        assert_eq!(args["NAME"], "MockProject");
        assert_eq!(args["JOBS"], "4");
        assert!(!has_references(&args["NAME"]));
    }
}
