//! Plugin contracts of the command engine and the registry holding them.
//!
//! The engine exposes five independent slots. Each slot accepts a single
//! registration; reading an empty slot fills it with the default plugin.

mod hooks;
mod registry;
mod strategy;

pub use hooks::{
    CommandExecutionHook, DefaultCommandExecutionHook, DefaultEventNotifier,
    DefaultMetricsPublisher, DefaultPropertiesStrategy, EventNotifier, ExecutionEvent,
    MetricsPublisher, PropertiesStrategy,
};
#[cfg(test)]
pub use hooks::{
    MockCommandExecutionHook, MockEventNotifier, MockMetricsPublisher, MockPropertiesStrategy,
};
pub use registry::{PluginRegistry, PluginSlot, PluginSnapshot};
pub use strategy::{ConcurrencyStrategy, ConcurrencyStrategyExt, DefaultConcurrencyStrategy};
