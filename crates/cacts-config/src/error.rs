//! Configuration errors.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Expectation(String),

    #[error("missing '{section}' section in configuration file\n - config file: {origin}\n - sections found: {found}")]
    MissingSection {
        section: String,
        origin: String,
        found: String,
    },

    #[error("{kind} '{name}' not found in the '{section}' section of the config file\n - available {kind}s: {available}")]
    UnknownEntry {
        kind: String,
        name: String,
        section: String,
        available: String,
    },

    #[error("invalid '{section}' configuration:\n{}", format_issues(.issues))]
    Schema {
        section: String,
        issues: Vec<SchemaIssue>,
    },

    #[error("invalid value for {field} of {entity}: {message}")]
    InvalidValue {
        entity: String,
        field: String,
        message: String,
    },

    #[error("invalid reference ${{{object}.{attribute}}} in '{original}': object must be one of {valid}")]
    UnknownObject {
        object: String,
        attribute: String,
        original: String,
        valid: String,
    },

    #[error("invalid reference ${{{object}.{attribute}}} in '{original}': {object} has no attribute '{attribute}'\n - existing attributes: {available}")]
    UnknownAttribute {
        object: String,
        attribute: String,
        original: String,
        available: String,
    },

    #[error("cannot use attribute {object}.{attribute} in '{original}', since it is not set")]
    UnsetAttribute {
        object: String,
        attribute: String,
        original: String,
    },

    #[error("could not evaluate the command\n  - original string: {original}\n  - command: {command}\n  - error: {error}")]
    CommandSubstitution {
        original: String,
        command: String,
        error: String,
    },

    #[error(transparent)]
    Host(#[from] cacts_core::Error),

    /// A broken engine invariant. Indicates a bug, not bad input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConfigError {
    /// Whether this error signals a programming error rather than bad configuration.
    pub fn is_internal(&self) -> bool {
        matches!(self, ConfigError::Internal(_))
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// One type or shape problem found while validating a configuration section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Entry within the section, e.g. a build type name.
    pub entry: String,
    pub field: String,
    pub message: String,
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "  - {}: {}", self.entry, self.message)
        } else {
            write!(f, "  - {}.{}: {}", self.entry, self.field, self.message)
        }
    }
}

fn format_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fail with a configuration error carrying `message` unless `condition` holds.
pub fn expect(condition: bool, message: impl Into<String>) -> ConfigResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Expectation(message.into()))
    }
}

/// Like [`expect`], with a caller-chosen error built only on failure.
pub fn expect_with<E>(condition: bool, err: impl FnOnce() -> E) -> Result<(), E> {
    if condition { Ok(()) } else { Err(err()) }
}
