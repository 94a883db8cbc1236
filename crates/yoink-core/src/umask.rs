//! Scoped process umask clearing for directory creation.
//!
//! The umask is a process-global mutation, so clearing it is wrapped in an
//! RAII guard that restores the original value on every exit path
//! (success, error, or panic unwind). Platforms without a process umask
//! (Windows) get a no-op guard.

#[cfg(unix)]
pub struct UmaskGuard {
    previous: libc::mode_t,
}

#[cfg(unix)]
impl UmaskGuard {
    /// Clear the umask to 0o000 and remember the previous value.
    pub fn clear() -> Self {
        // SAFETY: umask(2) only mutates process-global state; no pointers
        // involved, and the previous value is always captured so it can be
        // restored.
        let previous = unsafe { libc::umask(0o000) };
        Self { previous }
    }
}

#[cfg(unix)]
impl Drop for UmaskGuard {
    fn drop(&mut self) {
        // SAFETY: see `clear`.
        unsafe {
            libc::umask(self.previous);
        }
    }
}

#[cfg(not(unix))]
pub struct UmaskGuard;

#[cfg(not(unix))]
impl UmaskGuard {
    pub fn clear() -> Self {
        Self
    }
}
