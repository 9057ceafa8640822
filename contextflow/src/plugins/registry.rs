//! The engine's five-slot plugin registry.

use super::hooks::{
    CommandExecutionHook, DefaultCommandExecutionHook, DefaultEventNotifier,
    DefaultMetricsPublisher, DefaultPropertiesStrategy, EventNotifier, MetricsPublisher,
    PropertiesStrategy,
};
use super::strategy::{ConcurrencyStrategy, DefaultConcurrencyStrategy};
use crate::errors::PluginError;
use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Names one of the engine's plugin slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginSlot {
    /// Wraps work before it is scheduled.
    ConcurrencyStrategy,
    /// Publishes execution metrics.
    MetricsPublisher,
    /// Receives execution events.
    EventNotifier,
    /// Resolves command properties.
    PropertiesStrategy,
    /// Observes each execution.
    CommandExecutionHook,
}

impl PluginSlot {
    /// Returns the slot name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConcurrencyStrategy => "concurrency-strategy",
            Self::MetricsPublisher => "metrics-publisher",
            Self::EventNotifier => "event-notifier",
            Self::PropertiesStrategy => "properties-strategy",
            Self::CommandExecutionHook => "command-execution-hook",
        }
    }
}

impl fmt::Display for PluginSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
struct Slots {
    concurrency_strategy: Option<Arc<dyn ConcurrencyStrategy>>,
    metrics_publisher: Option<Arc<dyn MetricsPublisher>>,
    event_notifier: Option<Arc<dyn EventNotifier>>,
    properties_strategy: Option<Arc<dyn PropertiesStrategy>>,
    command_execution_hook: Option<Arc<dyn CommandExecutionHook>>,
}

impl Slots {
    fn is_set(&self, slot: PluginSlot) -> bool {
        match slot {
            PluginSlot::ConcurrencyStrategy => self.concurrency_strategy.is_some(),
            PluginSlot::MetricsPublisher => self.metrics_publisher.is_some(),
            PluginSlot::EventNotifier => self.event_notifier.is_some(),
            PluginSlot::PropertiesStrategy => self.properties_strategy.is_some(),
            PluginSlot::CommandExecutionHook => self.command_execution_hook.is_some(),
        }
    }

    /// Reads every slot, filling empty ones with defaults.
    fn snapshot(&mut self) -> PluginSnapshot {
        PluginSnapshot {
            concurrency_strategy: Arc::clone(
                self.concurrency_strategy
                    .get_or_insert_with(default_concurrency_strategy),
            ),
            metrics_publisher: Arc::clone(
                self.metrics_publisher
                    .get_or_insert_with(default_metrics_publisher),
            ),
            event_notifier: Arc::clone(self.event_notifier.get_or_insert_with(default_event_notifier)),
            properties_strategy: Arc::clone(
                self.properties_strategy
                    .get_or_insert_with(default_properties_strategy),
            ),
            command_execution_hook: Arc::clone(
                self.command_execution_hook
                    .get_or_insert_with(default_command_execution_hook),
            ),
        }
    }
}

fn default_concurrency_strategy() -> Arc<dyn ConcurrencyStrategy> {
    Arc::new(DefaultConcurrencyStrategy)
}

fn default_metrics_publisher() -> Arc<dyn MetricsPublisher> {
    Arc::new(DefaultMetricsPublisher)
}

fn default_event_notifier() -> Arc<dyn EventNotifier> {
    Arc::new(DefaultEventNotifier)
}

fn default_properties_strategy() -> Arc<dyn PropertiesStrategy> {
    Arc::new(DefaultPropertiesStrategy)
}

fn default_command_execution_hook() -> Arc<dyn CommandExecutionHook> {
    Arc::new(DefaultCommandExecutionHook)
}

fn occupy<P: ?Sized>(
    slot: &mut Option<Arc<P>>,
    name: PluginSlot,
    plugin: Arc<P>,
) -> Result<(), PluginError> {
    if slot.is_some() {
        return Err(PluginError::SlotOccupied { slot: name });
    }
    *slot = Some(plugin);
    Ok(())
}

/// The plugins held by all five slots at one point in time.
#[derive(Clone)]
pub struct PluginSnapshot {
    /// The concurrency strategy.
    pub concurrency_strategy: Arc<dyn ConcurrencyStrategy>,
    /// The metrics publisher.
    pub metrics_publisher: Arc<dyn MetricsPublisher>,
    /// The event notifier.
    pub event_notifier: Arc<dyn EventNotifier>,
    /// The properties strategy.
    pub properties_strategy: Arc<dyn PropertiesStrategy>,
    /// The command execution hook.
    pub command_execution_hook: Arc<dyn CommandExecutionHook>,
}

impl fmt::Debug for PluginSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginSnapshot")
            .field("concurrency_strategy", &self.concurrency_strategy.name())
            .finish_non_exhaustive()
    }
}

/// Explicit registry of the engine's plugins.
///
/// Each slot accepts one registration. Reading an empty slot fills it with
/// the default plugin, after which a plain registration for that slot fails;
/// [`reset_and_register`](Self::reset_and_register) is the way to replace
/// the concurrency strategy once the engine has started.
#[derive(Default)]
pub struct PluginRegistry {
    slots: RwLock<Slots>,
}

impl PluginRegistry {
    /// Creates a registry with all slots empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the concurrency strategy, installing the default if unset.
    pub fn concurrency_strategy(&self) -> Arc<dyn ConcurrencyStrategy> {
        if let Some(plugin) = self.slots.read().concurrency_strategy.as_ref() {
            return Arc::clone(plugin);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .concurrency_strategy
                .get_or_insert_with(default_concurrency_strategy),
        )
    }

    /// Returns the metrics publisher, installing the default if unset.
    pub fn metrics_publisher(&self) -> Arc<dyn MetricsPublisher> {
        if let Some(plugin) = self.slots.read().metrics_publisher.as_ref() {
            return Arc::clone(plugin);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.metrics_publisher.get_or_insert_with(default_metrics_publisher))
    }

    /// Returns the event notifier, installing the default if unset.
    pub fn event_notifier(&self) -> Arc<dyn EventNotifier> {
        if let Some(plugin) = self.slots.read().event_notifier.as_ref() {
            return Arc::clone(plugin);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.event_notifier.get_or_insert_with(default_event_notifier))
    }

    /// Returns the properties strategy, installing the default if unset.
    pub fn properties_strategy(&self) -> Arc<dyn PropertiesStrategy> {
        if let Some(plugin) = self.slots.read().properties_strategy.as_ref() {
            return Arc::clone(plugin);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .properties_strategy
                .get_or_insert_with(default_properties_strategy),
        )
    }

    /// Returns the command execution hook, installing the default if unset.
    pub fn command_execution_hook(&self) -> Arc<dyn CommandExecutionHook> {
        if let Some(plugin) = self.slots.read().command_execution_hook.as_ref() {
            return Arc::clone(plugin);
        }
        let mut slots = self.slots.write();
        Arc::clone(
            slots
                .command_execution_hook
                .get_or_insert_with(default_command_execution_hook),
        )
    }

    /// Registers the concurrency strategy.
    ///
    /// # Errors
    ///
    /// Returns `SlotOccupied` if the slot already holds a plugin.
    pub fn register_concurrency_strategy(
        &self,
        plugin: Arc<dyn ConcurrencyStrategy>,
    ) -> Result<(), PluginError> {
        occupy(
            &mut self.slots.write().concurrency_strategy,
            PluginSlot::ConcurrencyStrategy,
            plugin,
        )
    }

    /// Registers the metrics publisher.
    ///
    /// # Errors
    ///
    /// Returns `SlotOccupied` if the slot already holds a plugin.
    pub fn register_metrics_publisher(
        &self,
        plugin: Arc<dyn MetricsPublisher>,
    ) -> Result<(), PluginError> {
        occupy(
            &mut self.slots.write().metrics_publisher,
            PluginSlot::MetricsPublisher,
            plugin,
        )
    }

    /// Registers the event notifier.
    ///
    /// # Errors
    ///
    /// Returns `SlotOccupied` if the slot already holds a plugin.
    pub fn register_event_notifier(&self, plugin: Arc<dyn EventNotifier>) -> Result<(), PluginError> {
        occupy(
            &mut self.slots.write().event_notifier,
            PluginSlot::EventNotifier,
            plugin,
        )
    }

    /// Registers the properties strategy.
    ///
    /// # Errors
    ///
    /// Returns `SlotOccupied` if the slot already holds a plugin.
    pub fn register_properties_strategy(
        &self,
        plugin: Arc<dyn PropertiesStrategy>,
    ) -> Result<(), PluginError> {
        occupy(
            &mut self.slots.write().properties_strategy,
            PluginSlot::PropertiesStrategy,
            plugin,
        )
    }

    /// Registers the command execution hook.
    ///
    /// # Errors
    ///
    /// Returns `SlotOccupied` if the slot already holds a plugin.
    pub fn register_command_execution_hook(
        &self,
        plugin: Arc<dyn CommandExecutionHook>,
    ) -> Result<(), PluginError> {
        occupy(
            &mut self.slots.write().command_execution_hook,
            PluginSlot::CommandExecutionHook,
            plugin,
        )
    }

    /// Returns true if `slot` holds a plugin. Does not install defaults.
    #[must_use]
    pub fn is_registered(&self, slot: PluginSlot) -> bool {
        self.slots.read().is_set(slot)
    }

    /// Clears all five slots at once.
    pub fn reset(&self) {
        *self.slots.write() = Slots::default();
        debug!("Plugin registry reset");
    }

    /// Returns the plugins held by every slot, installing defaults into
    /// empty slots.
    pub fn snapshot(&self) -> PluginSnapshot {
        self.slots.write().snapshot()
    }

    /// Replaces the concurrency strategy while keeping the other four plugins.
    ///
    /// Under a single write lock: snapshots all five slots, resets the
    /// registry, re-registers the four preserved plugins, then registers
    /// `strategy`. Returns the snapshot taken before the reset.
    ///
    /// # Errors
    ///
    /// Returns `SlotOccupied` if a re-registration conflicts, which leaves
    /// the registry partially restored.
    pub fn reset_and_register(
        &self,
        strategy: Arc<dyn ConcurrencyStrategy>,
    ) -> Result<PluginSnapshot, PluginError> {
        let mut slots = self.slots.write();
        let had_strategy = slots.is_set(PluginSlot::ConcurrencyStrategy);
        let prior = slots.snapshot();
        *slots = Slots::default();

        occupy(
            &mut slots.metrics_publisher,
            PluginSlot::MetricsPublisher,
            Arc::clone(&prior.metrics_publisher),
        )?;
        occupy(
            &mut slots.event_notifier,
            PluginSlot::EventNotifier,
            Arc::clone(&prior.event_notifier),
        )?;
        occupy(
            &mut slots.properties_strategy,
            PluginSlot::PropertiesStrategy,
            Arc::clone(&prior.properties_strategy),
        )?;
        occupy(
            &mut slots.command_execution_hook,
            PluginSlot::CommandExecutionHook,
            Arc::clone(&prior.command_execution_hook),
        )?;

        let name = strategy.name().to_string();
        occupy(
            &mut slots.concurrency_strategy,
            PluginSlot::ConcurrencyStrategy,
            strategy,
        )?;

        if had_strategy {
            warn!(
                strategy = %name,
                replaced = prior.concurrency_strategy.name(),
                "Replacing existing concurrency strategy"
            );
        }
        info!(strategy = %name, "Concurrency strategy registered; other plugins preserved");
        Ok(prior)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        let registered: Vec<&str> = [
            PluginSlot::ConcurrencyStrategy,
            PluginSlot::MetricsPublisher,
            PluginSlot::EventNotifier,
            PluginSlot::PropertiesStrategy,
            PluginSlot::CommandExecutionHook,
        ]
        .into_iter()
        .filter(|slot| slots.is_set(*slot))
        .map(|slot| slot.as_str())
        .collect();
        f.debug_struct("PluginRegistry")
            .field("registered", &registered)
            .finish()
    }
}
