//! Propagation of the request attribute holder.

use super::{CapturedContext, ContextWrapper, TeardownMode};
use crate::context::{RequestAttributes, RequestContextHolder, TeardownGuard};
use std::sync::Arc;
use tracing::trace;

/// Binds the submitting thread's [`RequestAttributes`] on the worker.
///
/// The holder is shared, not copied: writes made by the worker are visible
/// to the request that submitted the work. When nothing is bound at wrap
/// time the worker runs with an empty holder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestAttributesWrapper {
    mode: TeardownMode,
}

impl RequestAttributesWrapper {
    /// Creates a wrapper that resets the worker's holder on teardown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the teardown mode.
    #[must_use]
    pub fn with_mode(mut self, mode: TeardownMode) -> Self {
        self.mode = mode;
        self
    }
}

impl ContextWrapper for RequestAttributesWrapper {
    fn name(&self) -> &str {
        "request-attributes"
    }

    fn capture(&self) -> Box<dyn CapturedContext> {
        Box::new(RequestCapture {
            attributes: RequestContextHolder::current(),
            mode: self.mode,
        })
    }
}

struct RequestCapture {
    attributes: Option<Arc<RequestAttributes>>,
    mode: TeardownMode,
}

impl CapturedContext for RequestCapture {
    fn install(self: Box<Self>) -> TeardownGuard {
        let Self { attributes, mode } = *self;
        trace!(
            request_id = ?attributes.as_ref().map(|a| a.id()),
            "Installing request attributes"
        );
        let previous = RequestContextHolder::replace(attributes);

        match mode {
            TeardownMode::Clear => TeardownGuard::new(RequestContextHolder::reset),
            TeardownMode::RestorePrevious => TeardownGuard::new(move || {
                RequestContextHolder::replace(previous);
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrappers::ContextWrapperExt;
    use crate::work::UnitOfWork;
    use serde_json::json;

    #[test]
    fn test_worker_shares_submitting_holder() {
        let attributes = RequestAttributes::shared();
        attributes.set("request_id", json!("r-42"));
        RequestContextHolder::set(attributes.clone());

        let work = RequestAttributesWrapper::new().wrap(UnitOfWork::new(|| {
            let bound = RequestContextHolder::current_or_err()?;
            bound.set("handled_by", json!("worker"));
            Ok(bound.get("request_id"))
        }));

        let (seen, after) = std::thread::spawn(move || {
            let seen = work.call().unwrap();
            (seen, RequestContextHolder::current().is_none())
        })
        .join()
        .unwrap();

        assert_eq!(seen, Some(json!("r-42")));
        assert!(after);
        assert_eq!(attributes.get("handled_by"), Some(json!("worker")));
        RequestContextHolder::reset();
    }

    #[test]
    fn test_unbound_holder_propagates_as_empty() {
        RequestContextHolder::reset();
        let work = RequestAttributesWrapper::new()
            .wrap(UnitOfWork::new(|| Ok(RequestContextHolder::current().is_some())));

        let bound = std::thread::spawn(move || {
            RequestContextHolder::set(RequestAttributes::shared());
            work.call().unwrap()
        })
        .join()
        .unwrap();

        assert!(!bound);
    }

    #[test]
    fn test_restore_previous_keeps_worker_binding() {
        RequestContextHolder::set(RequestAttributes::shared());
        let wrapper = RequestAttributesWrapper::new().with_mode(TeardownMode::RestorePrevious);
        let work = wrapper.wrap(UnitOfWork::from_value(()));

        let kept = std::thread::spawn(move || {
            let own = RequestAttributes::shared();
            RequestContextHolder::set(own.clone());
            work.call().unwrap();
            RequestContextHolder::current().is_some_and(|bound| Arc::ptr_eq(&bound, &own))
        })
        .join()
        .unwrap();

        assert!(kept);
        RequestContextHolder::reset();
    }
}
