//! Scoped umask for writes into areas shared with other users.

use tracing::debug;

/// Group-writable files and directories.
pub const SHARED_UMASK: u32 = 0o002;

/// Sets the process umask while alive and restores the previous one on drop.
///
/// The umask is process-wide, so do not hold a `SharedArea` while other
/// threads create files that need the original permissions.
#[must_use = "the previous umask is restored as soon as the guard is dropped"]
pub struct SharedArea {
    previous: libc::mode_t,
}

impl SharedArea {
    pub fn new() -> Self {
        Self::with_umask(SHARED_UMASK)
    }

    pub fn with_umask(mask: u32) -> Self {
        // SAFETY: umask only swaps the process file mode creation mask.
        let previous = unsafe { libc::umask(mask as libc::mode_t) };
        debug!(umask = %format!("{:o}", mask), "Entering shared area");
        Self { previous }
    }
}

impl Default for SharedArea {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SharedArea {
    fn drop(&mut self) {
        // SAFETY: see `with_umask`.
        unsafe {
            libc::umask(self.previous);
        }
    }
}
