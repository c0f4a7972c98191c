//! Machine definition.

use serde::{Deserialize, Serialize};

/// Name of the machine whose definition may come from the user's home directory.
pub const LOCAL_MACHINE: &str = "local";

/// Identity and resource policy for an execution host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub name: String,
    /// Resources available for building.
    pub num_bld_res: u32,
    /// Resources available for running tests.
    pub num_run_res: u32,
    /// Shell snippets run, in order, before every other command.
    pub env_setup: Vec<String>,
    /// GPU architecture. Present only on GPU machines.
    pub gpu_arch: Option<String>,
}

impl Machine {
    pub fn uses_gpu(&self) -> bool {
        self.gpu_arch.is_some()
    }

    pub fn is_local(&self) -> bool {
        self.name == LOCAL_MACHINE
    }

    /// The env setup snippets chained into a single shell prefix.
    ///
    /// Returns `None` when there is nothing to set up.
    pub fn env_setup_command(&self) -> Option<String> {
        if self.env_setup.is_empty() {
            None
        } else {
            Some(self.env_setup.join(" && "))
        }
    }
}
