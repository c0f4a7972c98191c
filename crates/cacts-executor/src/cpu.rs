//! Available CPU counting.
//!
//! The count reflects what this process (and its children) may actually use:
//! a SLURM core binding wins over the cgroup CPU quota and the process
//! affinity mask, which win over the machine-wide count.

use cacts_core::{Error, Result};
use tracing::debug;

/// Environment variable holding the SLURM hexadecimal CPU bind mask.
pub const SLURM_CPU_BIND_LIST: &str = "SLURM_CPU_BIND_LIST";

/// Number of CPUs available to this process.
///
/// `logical = false` divides by the hyperthreading ratio to approximate
/// physical cores. Never returns less than 1.
pub fn available_cpu_count(logical: bool) -> Result<usize> {
    let count = match std::env::var(SLURM_CPU_BIND_LIST) {
        Ok(mask) => {
            let ids = cpu_ids_from_bind_mask(&mask)?;
            debug!(mask = %mask, count = ids.len(), "Using SLURM cpu bind mask");
            ids.len()
        }
        Err(_) => restricted_cpu_count(),
    };

    let count = if logical {
        count
    } else {
        count / hyperthread_ratio()
    };
    Ok(count.max(1))
}

/// Logical CPU ids set in a hexadecimal bind mask such as `0xF0`.
///
/// Bit `i` of the mask selects CPU `i`. Masks may be arbitrarily wide.
pub fn cpu_ids_from_bind_mask(mask: &str) -> Result<Vec<usize>> {
    let trimmed = mask.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(Error::InvalidInput(format!(
            "empty cpu bind mask in {}: '{}'",
            SLURM_CPU_BIND_LIST, mask
        )));
    }

    let mut ids = Vec::new();
    for (position, c) in digits.chars().rev().enumerate() {
        let nibble = c.to_digit(16).ok_or_else(|| {
            Error::InvalidInput(format!(
                "invalid cpu bind mask in {}: '{}'",
                SLURM_CPU_BIND_LIST, mask
            ))
        })?;
        for bit in 0..4 {
            if nibble & (1 << bit) != 0 {
                ids.push(position * 4 + bit);
            }
        }
    }
    Ok(ids)
}

fn hyperthread_ratio() -> usize {
    let physical = num_cpus::get_physical().max(1);
    (num_cpus::get() / physical).max(1)
}

/// CPUs usable under the cgroup quota and the affinity mask.
fn restricted_cpu_count() -> usize {
    let count = num_cpus::get();
    debug!(count, "Using cgroup/affinity cpu count");
    count
}
