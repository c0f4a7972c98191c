//! Core configuration entities for CACTS build/test runs.
//!
//! This crate contains:
//! - The resolved `Project`, `Machine` and `BuildType` records
//! - The error type shared by host-level operations
//!
//! Parsing, merging and expansion of these records lives in `cacts-config`.

pub mod build_type;
pub mod error;
pub mod machine;
pub mod project;

pub use build_type::BuildType;
pub use error::{Error, Result};
pub use machine::Machine;
pub use project::Project;
