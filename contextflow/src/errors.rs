//! Error types for the contextflow crate.
//!
//! Failures raised by a unit of work are not represented here: they travel
//! as [`WorkError`](crate::work::WorkError) and are never translated.

use crate::plugins::PluginSlot;
use thiserror::Error;

/// The main error type for contextflow operations.
#[derive(Debug, Error)]
pub enum ContextflowError {
    /// The concurrency strategy was constructed without a wrapper collection.
    #[error("Parameter 'wrappers' can not be absent")]
    MissingWrappers,

    /// The startup registration was triggered more than once.
    #[error("Context propagation has already been configured")]
    AlreadyConfigured,

    /// No request attributes are bound to the calling thread.
    #[error("No request attributes are bound to the current thread")]
    NoRequestAttributes,

    /// The worker running a command panicked.
    #[error("Command '{command_key}' worker panicked: {reason}")]
    WorkerPanicked {
        /// The command whose worker failed.
        command_key: String,
        /// The join failure reported by the runtime.
        reason: String,
    },

    /// The tracing subscriber could not be installed.
    #[error("Logging initialization failed: {0}")]
    Logging(String),

    /// Settings could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A plugin registry operation failed.
    #[error("{0}")]
    Plugin(#[from] PluginError),
}

/// Errors raised by the engine's plugin registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// The slot already holds a plugin; slots accept a single registration.
    #[error("Another {slot} is already registered")]
    SlotOccupied {
        /// The occupied slot.
        slot: PluginSlot,
    },
}
