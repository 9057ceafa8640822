//! Minimal command dispatcher.
//!
//! Submits units of work to Tokio's blocking pool through the registered
//! plugins: the concurrency strategy wraps the work on the submitting
//! thread, the remaining plugins observe it on the worker.

use crate::errors::ContextflowError;
use crate::plugins::{ConcurrencyStrategyExt, ExecutionEvent, PluginRegistry};
use crate::work::{UnitOfWork, WorkResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Runs commands on worker threads using the plugins of a [`PluginRegistry`].
#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<PluginRegistry>,
}

impl CommandDispatcher {
    /// Creates a dispatcher reading plugins from `registry`.
    #[must_use]
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the plugin registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Wraps `work` on the calling thread and schedules it on the blocking
    /// pool.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit<T>(&self, command_key: impl Into<String>, work: UnitOfWork<T>) -> PendingCommand<T>
    where
        T: Send + 'static,
    {
        let command_key = command_key.into();
        let strategy = self.registry.concurrency_strategy();
        let wrapped = strategy.wrap_callable(work);
        let cache_key = self.registry.properties_strategy().cache_key(&command_key);

        debug!(
            command_key = %command_key,
            strategy = strategy.name(),
            layers = wrapped.layers(),
            "Submitting command"
        );

        let hook = self.registry.command_execution_hook();
        let notifier = self.registry.event_notifier();
        let metrics = self.registry.metrics_publisher();
        let key = command_key.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            hook.on_start(&key);

            let result = wrapped.call();

            match &result {
                Ok(_) => {
                    hook.on_success(&key);
                    notifier.mark_event(ExecutionEvent::Success, &key);
                }
                Err(e) => {
                    hook.on_error(&key, e);
                    notifier.mark_event(ExecutionEvent::Failure, &key);
                }
            }
            metrics.record_execution(&key, started.elapsed(), result.is_ok());

            result
        });

        PendingCommand {
            command_key,
            cache_key,
            handle,
        }
    }

    /// Submits `work` and waits for its result.
    ///
    /// Wrapping happens when this is called, not when the future is polled.
    pub fn execute<T>(
        &self,
        command_key: impl Into<String>,
        work: UnitOfWork<T>,
    ) -> impl Future<Output = WorkResult<T>>
    where
        T: Send + 'static,
    {
        self.submit(command_key, work).join()
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("registry", &self.registry)
            .finish()
    }
}

/// A submitted command whose work is running or queued.
#[derive(Debug)]
pub struct PendingCommand<T> {
    command_key: String,
    cache_key: Option<String>,
    handle: JoinHandle<WorkResult<T>>,
}

impl<T> PendingCommand<T> {
    /// Returns the command key.
    #[must_use]
    pub fn command_key(&self) -> &str {
        &self.command_key
    }

    /// Returns the properties cache key resolved at submit time.
    #[must_use]
    pub fn cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref()
    }

    /// Waits for the work to finish.
    ///
    /// The work's own failure is returned untouched. A panicking worker is
    /// reported as [`ContextflowError::WorkerPanicked`].
    pub async fn join(self) -> WorkResult<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(command_key = %self.command_key, error = %e, "Command worker failed");
                Err(ContextflowError::WorkerPanicked {
                    command_key: self.command_key,
                    reason: e.to_string(),
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concurrency::ContextAwareConcurrencyStrategy;
    use crate::plugins::{
        MockCommandExecutionHook, MockEventNotifier, MockMetricsPublisher, MockPropertiesStrategy,
    };
    use crate::testing::{assert_torn_down_once, CallLog, RecordingWrapper};
    use pretty_assertions::assert_eq;

    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_execute_returns_value() {
        let dispatcher = CommandDispatcher::new(Arc::new(PluginRegistry::new()));

        let value = dispatcher
            .execute("answer", UnitOfWork::from_value(42))
            .await
            .unwrap();

        assert_eq!(value, 42);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_work_error_passes_through_untranslated() {
        let dispatcher = CommandDispatcher::new(Arc::new(PluginRegistry::new()));

        let err = dispatcher
            .execute("quota", UnitOfWork::<()>::new(|| Err(QuotaExceeded.into())))
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<QuotaExceeded>().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_plugins_observe_success() {
        let registry = Arc::new(PluginRegistry::new());

        let mut hook = MockCommandExecutionHook::new();
        hook.expect_on_start()
            .withf(|key: &str| key == "lookup")
            .times(1)
            .return_const(());
        hook.expect_on_success()
            .withf(|key: &str| key == "lookup")
            .times(1)
            .return_const(());
        hook.expect_on_error().times(0);

        let mut notifier = MockEventNotifier::new();
        notifier
            .expect_mark_event()
            .withf(|event: &ExecutionEvent, key: &str| *event == ExecutionEvent::Success && key == "lookup")
            .times(1)
            .return_const(());

        let mut metrics = MockMetricsPublisher::new();
        metrics
            .expect_record_execution()
            .withf(|key: &str, _elapsed: &std::time::Duration, succeeded: &bool| key == "lookup" && *succeeded)
            .times(1)
            .return_const(());

        registry.register_command_execution_hook(Arc::new(hook)).unwrap();
        registry.register_event_notifier(Arc::new(notifier)).unwrap();
        registry.register_metrics_publisher(Arc::new(metrics)).unwrap();

        let dispatcher = CommandDispatcher::new(registry);
        dispatcher
            .execute("lookup", UnitOfWork::from_value("found"))
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_plugins_observe_failure() {
        let registry = Arc::new(PluginRegistry::new());

        let mut hook = MockCommandExecutionHook::new();
        hook.expect_on_start().times(1).return_const(());
        hook.expect_on_success().times(0);
        hook.expect_on_error()
            .withf(|key: &str, error: &anyhow::Error| {
                key == "quota" && error.downcast_ref::<QuotaExceeded>().is_some()
            })
            .times(1)
            .return_const(());

        let mut notifier = MockEventNotifier::new();
        notifier
            .expect_mark_event()
            .withf(|event: &ExecutionEvent, _key: &str| *event == ExecutionEvent::Failure)
            .times(1)
            .return_const(());

        registry.register_command_execution_hook(Arc::new(hook)).unwrap();
        registry.register_event_notifier(Arc::new(notifier)).unwrap();

        let dispatcher = CommandDispatcher::new(registry);
        let result = dispatcher
            .execute("quota", UnitOfWork::<u8>::new(|| Err(QuotaExceeded.into())))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cache_key_resolved_at_submit() {
        let registry = Arc::new(PluginRegistry::new());
        let mut properties = MockPropertiesStrategy::new();
        properties
            .expect_cache_key()
            .withf(|key: &str| key == "profile")
            .times(1)
            .returning(|key: &str| Some(format!("cache:{key}")));
        registry.register_properties_strategy(Arc::new(properties)).unwrap();

        let dispatcher = CommandDispatcher::new(registry);
        let pending = dispatcher.submit("profile", UnitOfWork::from_value(()));

        assert_eq!(pending.command_key(), "profile");
        assert_eq!(pending.cache_key(), Some("cache:profile"));
        pending.join().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_panicking_work_tears_down_and_reports() {
        let log = CallLog::new();
        let registry = Arc::new(PluginRegistry::new());
        registry
            .register_concurrency_strategy(Arc::new(ContextAwareConcurrencyStrategy::new(vec![
                Arc::new(RecordingWrapper::new("w1", log.clone())),
                Arc::new(RecordingWrapper::new("w2", log.clone())),
            ])))
            .unwrap();
        let dispatcher = CommandDispatcher::new(registry);

        let err = dispatcher
            .execute("explode", UnitOfWork::<()>::new(|| panic!("boom")))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ContextflowError>(),
            Some(ContextflowError::WorkerPanicked { command_key, .. }) if command_key == "explode"
        ));
        assert_torn_down_once(&log, &["w1", "w2"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_wrapping_happens_on_submit() {
        let log = CallLog::new();
        let registry = Arc::new(PluginRegistry::new());
        registry
            .register_concurrency_strategy(Arc::new(ContextAwareConcurrencyStrategy::new(vec![
                Arc::new(RecordingWrapper::new("w1", log.clone())),
            ])))
            .unwrap();
        let dispatcher = CommandDispatcher::new(registry);

        let future = dispatcher.execute("lazy", UnitOfWork::from_value(1));
        assert_eq!(log.count("capture:w1"), 1);

        assert_eq!(future.await.unwrap(), 1);
    }
}
