//! Release-on-drop guard for installed context.

use std::fmt;

/// Runs a teardown action exactly once when dropped.
///
/// Drop happens on normal return, on error propagation and while unwinding,
/// so the teardown runs for every install that completed.
#[must_use = "dropping the guard tears the context down immediately"]
pub struct TeardownGuard {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl TeardownGuard {
    /// Creates a guard that runs `teardown` on drop.
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Creates a guard with nothing to tear down.
    pub fn noop() -> Self {
        Self { teardown: None }
    }

    /// Runs the teardown now instead of at drop.
    pub fn release(mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }

    /// Returns true if the teardown has not run yet.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.teardown.is_some()
    }
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl fmt::Debug for TeardownGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeardownGuard")
            .field("armed", &self.is_armed())
            .finish()
    }
}
