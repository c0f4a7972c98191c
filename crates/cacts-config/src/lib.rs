//! YAML configuration resolution for CACTS.
//!
//! This crate handles:
//! - Loading the configuration file and the user-local machine file
//! - Validating the `project`, `machines` and `configurations` sections
//! - `${object.attribute}` reference expansion
//! - `$(command)` substitution

pub mod build_type;
pub mod commands;
pub mod error;
pub mod file;
pub mod machine;
pub mod project;
pub mod schema;
pub mod variables;
pub mod walk;

pub use build_type::resolve_build_type;
pub use commands::{CommandEvaluator, evaluate_commands};
pub use error::{ConfigError, ConfigResult, SchemaIssue, expect, expect_with};
pub use file::{ConfigFile, ResolvedConfig, local_machine_file};
pub use machine::resolve_machine;
pub use project::{parse_project, resolve_project};
pub use variables::{Namespace, expand_record, expand_variables, has_references};
pub use walk::{Record, StringPass, Walk};
