//! Local command execution and host queries for CACTS.
//!
//! Provides:
//! - Shell command execution with env setup and dry-run support
//! - Git repository queries (branch, commit, work tree detection)
//! - Available CPU counting (affinity and scheduler bind masks)
//! - A scoped umask guard for writes to shared areas

pub mod cpu;
pub mod git;
pub mod shell;
#[cfg(unix)]
pub mod shared_area;

pub use cacts_core::{Error, Result};
pub use cpu::{available_cpu_count, cpu_ids_from_bind_mask};
pub use git::{current_git_branch, current_git_commit, is_git_repository};
pub use shell::{CommandOutput, ShellCommand, run_command, run_command_or_fail};
#[cfg(unix)]
pub use shared_area::SharedArea;
