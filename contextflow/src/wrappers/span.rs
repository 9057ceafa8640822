//! Propagation of the current `tracing` span.

use super::{CapturedContext, ContextWrapper};
use crate::context::TeardownGuard;
use tracing::Span;

/// Enters the submitting thread's current span on the worker, so events
/// logged by the work are attributed to the request that scheduled it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanContextWrapper;

impl SpanContextWrapper {
    /// Creates a new span wrapper.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ContextWrapper for SpanContextWrapper {
    fn name(&self) -> &str {
        "tracing-span"
    }

    fn capture(&self) -> Box<dyn CapturedContext> {
        Box::new(SpanCapture {
            span: Span::current(),
        })
    }
}

struct SpanCapture {
    span: Span,
}

impl CapturedContext for SpanCapture {
    fn install(self: Box<Self>) -> TeardownGuard {
        if self.span.is_none() {
            return TeardownGuard::noop();
        }
        let entered = self.span.entered();
        TeardownGuard::new(move || drop(entered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrappers::ContextWrapperExt;
    use crate::work::UnitOfWork;
    use tracing::{dispatcher, info_span, Dispatch};

    fn current_span_name() -> UnitOfWork<Option<&'static str>> {
        UnitOfWork::new(|| Ok(Span::current().metadata().map(|m| m.name())))
    }

    #[test]
    fn test_worker_enters_submitting_span() {
        let dispatch = Dispatch::new(tracing_subscriber::registry());

        let work = dispatcher::with_default(&dispatch, || {
            let span = info_span!("handle_request");
            let _entered = span.enter();
            SpanContextWrapper::new().wrap(current_span_name())
        });

        let worker_dispatch = dispatch.clone();
        let (seen, after) = std::thread::spawn(move || {
            dispatcher::with_default(&worker_dispatch, || {
                let seen = work.call().unwrap();
                (seen, Span::current().is_none())
            })
        })
        .join()
        .unwrap();

        assert_eq!(seen, Some("handle_request"));
        assert!(after);
    }

    #[test]
    fn test_no_current_span_is_noop() {
        let work = SpanContextWrapper::new().wrap(current_span_name());

        let seen = std::thread::spawn(move || work.call().unwrap()).join().unwrap();

        assert_eq!(seen, None);
    }
}
