//! The deferred, single-shot computation scheduled by the engine.

use std::fmt;
use uuid::Uuid;

/// Error carried by a failing unit of work.
///
/// Wrappers never translate it, so callers can `downcast_ref` to the
/// concrete error type the base computation raised.
pub type WorkError = anyhow::Error;

/// Result of running a unit of work.
pub type WorkResult<T> = Result<T, WorkError>;

type Call<T> = Box<dyn FnOnce() -> WorkResult<T> + Send + 'static>;

/// A deferred computation producing a `T`, consumed exactly once.
///
/// Every unit carries an identity. Decorating a unit always produces a new
/// unit with a fresh identity; handing a unit through untouched keeps it.
pub struct UnitOfWork<T> {
    id: Uuid,
    layers: usize,
    call: Call<T>,
}

impl<T: 'static> UnitOfWork<T> {
    /// Creates a new unit of work from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> WorkResult<T> + Send + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            layers: 0,
            call: Box::new(f),
        }
    }

    /// Creates a unit of work that succeeds with `value`.
    pub fn from_value(value: T) -> Self
    where
        T: Send,
    {
        Self::new(move || Ok(value))
    }

    /// Returns the unit's identity.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns how many decorators surround the base computation.
    #[must_use]
    pub fn layers(&self) -> usize {
        self.layers
    }

    /// Runs the computation, consuming the unit.
    pub fn call(self) -> WorkResult<T> {
        (self.call)()
    }

    /// Wraps this unit in `around`, which receives the inner unit when the
    /// returned unit is called and decides how to run it.
    #[must_use]
    pub fn decorate<F>(self, around: F) -> Self
    where
        F: FnOnce(Self) -> WorkResult<T> + Send + 'static,
    {
        let layers = self.layers + 1;
        Self {
            id: Uuid::new_v4(),
            layers,
            call: Box::new(move || around(self)),
        }
    }
}

impl<T> fmt::Debug for UnitOfWork<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("id", &self.id)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, thiserror::Error)]
    #[error("lookup failed for {0}")]
    struct LookupError(u32);

    #[test]
    fn test_call_returns_value() {
        let work = UnitOfWork::new(|| Ok(21 * 2));
        assert_eq!(work.call().unwrap(), 42);
    }

    #[test]
    fn test_from_value() {
        let work = UnitOfWork::from_value("ready");
        assert_eq!(work.layers(), 0);
        assert_eq!(work.call().unwrap(), "ready");
    }

    #[test]
    fn test_decorate_assigns_new_identity() {
        let work = UnitOfWork::from_value(1);
        let base_id = work.id();

        let decorated = work.decorate(UnitOfWork::call);

        assert_ne!(decorated.id(), base_id);
        assert_eq!(decorated.layers(), 1);
        assert_eq!(decorated.call().unwrap(), 1);
    }

    #[test]
    fn test_decorate_runs_inner_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let work = UnitOfWork::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        work.decorate(UnitOfWork::call)
            .decorate(UnitOfWork::call)
            .call()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_keeps_its_type() {
        let work: UnitOfWork<()> = UnitOfWork::new(|| Err(LookupError(7).into()));

        let err = work.decorate(UnitOfWork::call).call().unwrap_err();

        let lookup = err.downcast_ref::<LookupError>().unwrap();
        assert_eq!(lookup.0, 7);
    }
}
