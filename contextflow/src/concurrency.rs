//! Context-aware concurrency strategy.
//!
//! The strategy registered with the engine's concurrency slot. Every
//! scheduling request runs the work through a fixed [`WrapperChain`].

use crate::errors::ContextflowError;
use crate::plugins::ConcurrencyStrategy;
use crate::work::UnitOfWork;
use crate::wrappers::{CapturedChain, ContextWrapper, WrapperChain};
use std::fmt;
use std::sync::Arc;

/// Decorates scheduled work with a fixed, ordered set of context wrappers.
///
/// An empty wrapper set makes the strategy a pass-through.
#[derive(Clone)]
pub struct ContextAwareConcurrencyStrategy {
    chain: WrapperChain,
}

impl ContextAwareConcurrencyStrategy {
    /// Creates a strategy from wrappers in registration order.
    #[must_use]
    pub fn new(wrappers: Vec<Arc<dyn ContextWrapper>>) -> Self {
        Self {
            chain: WrapperChain::new(wrappers),
        }
    }

    /// Creates a strategy from a wrapper collection that may be absent.
    ///
    /// # Errors
    ///
    /// Returns `MissingWrappers` if `wrappers` is `None`.
    pub fn try_new(wrappers: Option<Vec<Arc<dyn ContextWrapper>>>) -> Result<Self, ContextflowError> {
        wrappers.map(Self::new).ok_or(ContextflowError::MissingWrappers)
    }

    /// Returns the wrapper chain.
    #[must_use]
    pub fn chain(&self) -> &WrapperChain {
        &self.chain
    }

    /// Wraps `work` with every registered wrapper.
    pub fn wrap_callable<T: 'static>(&self, work: UnitOfWork<T>) -> UnitOfWork<T> {
        self.chain.build(work)
    }
}

impl ConcurrencyStrategy for ContextAwareConcurrencyStrategy {
    fn name(&self) -> &str {
        "context-aware"
    }

    fn capture(&self) -> CapturedChain {
        self.chain.capture()
    }
}

impl fmt::Debug for ContextAwareConcurrencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextAwareConcurrencyStrategy")
            .field("wrappers", &self.chain.names())
            .finish()
    }
}
