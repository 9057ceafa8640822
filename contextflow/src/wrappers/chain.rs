//! Context wrapper capability and the ordered wrapper chain.

use crate::context::TeardownGuard;
use crate::work::UnitOfWork;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Context captured on the submitting thread, waiting to be installed on a worker.
pub trait CapturedContext: Send {
    /// Installs the captured context into the current thread's slot.
    ///
    /// Dropping the returned guard tears the context down again.
    fn install(self: Box<Self>) -> TeardownGuard;
}

/// Propagates one kind of ambient context across the worker boundary.
///
/// `capture` runs on the submitting thread when work is wrapped; the
/// captured value is installed on the worker right before the work runs.
/// Implementations must be safe to call from many threads at once.
pub trait ContextWrapper: Send + Sync {
    /// Returns the wrapper's name, used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Snapshots the calling thread's ambient context.
    fn capture(&self) -> Box<dyn CapturedContext>;
}

/// Wrapping of units of work, for every [`ContextWrapper`].
pub trait ContextWrapperExt {
    /// Captures context now and returns a unit that installs it around `work`.
    ///
    /// The result is always a new unit, distinct from `work`.
    fn wrap<T: 'static>(&self, work: UnitOfWork<T>) -> UnitOfWork<T>;
}

impl<W: ContextWrapper + ?Sized> ContextWrapperExt for W {
    fn wrap<T: 'static>(&self, work: UnitOfWork<T>) -> UnitOfWork<T> {
        trace!(wrapper = self.name(), work_id = %work.id(), "Capturing context");
        apply_layer(work, self.capture())
    }
}

fn apply_layer<T: 'static>(work: UnitOfWork<T>, captured: Box<dyn CapturedContext>) -> UnitOfWork<T> {
    work.decorate(move |inner| {
        let _guard = captured.install();
        inner.call()
    })
}

/// Contexts captured for one scheduling request, in registration order.
#[derive(Default)]
pub struct CapturedChain {
    layers: Vec<Box<dyn CapturedContext>>,
}

impl CapturedChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a captured layer.
    pub fn push(&mut self, captured: Box<dyn CapturedContext>) {
        self.layers.push(captured);
    }

    /// Returns the number of captured layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Decorates `work` with every captured layer.
    ///
    /// The first layer ends up innermost, so at run time the last layer
    /// installs first and tears down last. An empty chain hands `work` back
    /// unchanged.
    pub fn apply<T: 'static>(self, work: UnitOfWork<T>) -> UnitOfWork<T> {
        self.layers
            .into_iter()
            .fold(work, apply_layer)
    }
}

impl fmt::Debug for CapturedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturedChain")
            .field("layers", &self.layers.len())
            .finish()
    }
}

/// An ordered, immutable sequence of context wrappers.
///
/// Insertion order is wrapping order: `[W1, W2, W3]` applied to `C` yields
/// `W3(W2(W1(C)))`.
#[derive(Clone, Default)]
pub struct WrapperChain {
    wrappers: Vec<Arc<dyn ContextWrapper>>,
}

impl WrapperChain {
    /// Creates a chain from wrappers in registration order.
    #[must_use]
    pub fn new(wrappers: Vec<Arc<dyn ContextWrapper>>) -> Self {
        Self { wrappers }
    }

    /// Returns the number of wrappers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    /// Returns true if the chain has no wrappers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// Returns the wrapper names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.wrappers.iter().map(|w| w.name()).collect()
    }

    /// Captures every wrapper's context on the calling thread, in
    /// registration order.
    #[must_use]
    pub fn capture(&self) -> CapturedChain {
        let mut chain = CapturedChain::new();
        for wrapper in &self.wrappers {
            trace!(wrapper = wrapper.name(), "Capturing context");
            chain.push(wrapper.capture());
        }
        chain
    }

    /// Composes `work` with every wrapper in the chain.
    pub fn build<T: 'static>(&self, work: UnitOfWork<T>) -> UnitOfWork<T> {
        build_chain(work, &self.wrappers)
    }
}

impl fmt::Debug for WrapperChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperChain")
            .field("wrappers", &self.names())
            .finish()
    }
}

/// Folds `wrappers` over `work`, left to right.
///
/// Each wrapper captures its context immediately, in sequence order.
pub fn build_chain<T: 'static>(work: UnitOfWork<T>, wrappers: &[Arc<dyn ContextWrapper>]) -> UnitOfWork<T> {
    wrappers.iter().fold(work, |acc, wrapper| wrapper.wrap(acc))
}
