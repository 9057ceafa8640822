//! Engine plugins that observe command execution.

use crate::work::WorkError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace};

/// Outcome events reported to the [`EventNotifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionEvent {
    /// The command's work returned a value.
    Success,
    /// The command's work failed.
    Failure,
}

impl ExecutionEvent {
    /// Returns the event name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for ExecutionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publishes per-command execution metrics.
#[cfg_attr(test, mockall::automock)]
pub trait MetricsPublisher: Send + Sync {
    /// Records one finished execution.
    fn record_execution(&self, command_key: &str, elapsed: Duration, succeeded: bool);
}

/// Receives execution outcome events.
#[cfg_attr(test, mockall::automock)]
pub trait EventNotifier: Send + Sync {
    /// Marks an event for a command.
    fn mark_event(&self, event: ExecutionEvent, command_key: &str);
}

/// Resolves command properties.
#[cfg_attr(test, mockall::automock)]
pub trait PropertiesStrategy: Send + Sync {
    /// Returns the key under which a command's properties are cached, or
    /// `None` to disable caching.
    fn cache_key(&self, command_key: &str) -> Option<String>;
}

/// Callbacks around each command execution, invoked on the worker thread.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutionHook: Send + Sync {
    /// Called before the work runs.
    fn on_start(&self, _command_key: &str) {}

    /// Called after the work returned a value.
    fn on_success(&self, _command_key: &str) {}

    /// Called after the work failed.
    fn on_error(&self, _command_key: &str, _error: &WorkError) {}
}

/// Metrics publisher used when none is registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMetricsPublisher;

impl MetricsPublisher for DefaultMetricsPublisher {
    fn record_execution(&self, command_key: &str, elapsed: Duration, succeeded: bool) {
        trace!(
            command_key,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            succeeded,
            "Command executed"
        );
    }
}

/// Event notifier used when none is registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEventNotifier;

impl EventNotifier for DefaultEventNotifier {
    fn mark_event(&self, event: ExecutionEvent, command_key: &str) {
        debug!(command_key, event = %event, "Command event");
    }
}

/// Properties strategy used when none is registered: caches by command key.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropertiesStrategy;

impl PropertiesStrategy for DefaultPropertiesStrategy {
    fn cache_key(&self, command_key: &str) -> Option<String> {
        Some(command_key.to_string())
    }
}

/// Execution hook used when none is registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCommandExecutionHook;

impl CommandExecutionHook for DefaultCommandExecutionHook {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_display() {
        assert_eq!(ExecutionEvent::Success.to_string(), "success");
        assert_eq!(ExecutionEvent::Failure.to_string(), "failure");
    }

    #[test]
    fn test_default_properties_cache_by_key() {
        let strategy = DefaultPropertiesStrategy;
        assert_eq!(strategy.cache_key("lookup"), Some("lookup".to_string()));
    }

    #[test]
    fn test_defaults_do_not_panic() {
        DefaultMetricsPublisher.record_execution("lookup", Duration::from_millis(3), true);
        DefaultEventNotifier.mark_event(ExecutionEvent::Failure, "lookup");
        let hook = DefaultCommandExecutionHook;
        hook.on_start("lookup");
        hook.on_error("lookup", &anyhow::anyhow!("boom"));
    }
}
