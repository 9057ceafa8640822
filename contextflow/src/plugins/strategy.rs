//! The concurrency-strategy plugin: the engine's single hook for wrapping
//! work before it is scheduled.

use crate::work::UnitOfWork;
use crate::wrappers::CapturedChain;

/// Decides how scheduled work is wrapped.
///
/// The engine calls [`capture`](Self::capture) once per scheduling request
/// on the submitting thread, then applies the captured chain to the work.
pub trait ConcurrencyStrategy: Send + Sync {
    /// Returns the strategy's name, used in logs.
    fn name(&self) -> &str;

    /// Captures submit-side context for one scheduling request.
    fn capture(&self) -> CapturedChain;
}

/// Wrapping of units of work, for every [`ConcurrencyStrategy`].
pub trait ConcurrencyStrategyExt {
    /// Wraps `work` for execution on a worker thread.
    fn wrap_callable<T: 'static>(&self, work: UnitOfWork<T>) -> UnitOfWork<T>;
}

impl<S: ConcurrencyStrategy + ?Sized> ConcurrencyStrategyExt for S {
    fn wrap_callable<T: 'static>(&self, work: UnitOfWork<T>) -> UnitOfWork<T> {
        self.capture().apply(work)
    }
}

/// The engine's built-in strategy: work passes through unwrapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConcurrencyStrategy;

impl ConcurrencyStrategy for DefaultConcurrencyStrategy {
    fn name(&self) -> &str {
        "default"
    }

    fn capture(&self) -> CapturedChain {
        CapturedChain::new()
    }
}
