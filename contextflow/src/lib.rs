//! # Contextflow
//!
//! Ambient context propagation for a command-execution engine.
//!
//! Work submitted to the engine runs on worker threads, where thread-bound
//! context such as the diagnostic logging map or the current request's
//! attributes is not visible. Contextflow plugs a concurrency strategy into
//! the engine that wraps every unit of work with an ordered chain of
//! context wrappers:
//!
//! - **Capture** happens on the submitting thread when the work is wrapped
//! - **Install** happens on the worker, just before the work runs
//! - **Teardown** happens on the worker after the work finishes, on success,
//!   failure or panic
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use contextflow::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(PluginRegistry::new());
//! ContextConfiguration::new(WrapperSettings::from_env()?)
//!     .with_wrapper(DiagnosticContextWrapper::new())
//!     .with_wrapper(RequestAttributesWrapper::new())
//!     .configure(&registry)?;
//!
//! let dispatcher = CommandDispatcher::new(registry);
//! DiagnosticContext::put("request_id", "req-1");
//! let value = dispatcher
//!     .execute("lookup", UnitOfWork::new(|| Ok(DiagnosticContext::get("request_id"))))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod concurrency;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod plugins;
pub mod testing;
pub mod work;
pub mod wrappers;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::concurrency::ContextAwareConcurrencyStrategy;
    pub use crate::config::{ConfigurationOutcome, ContextConfiguration, WrapperSettings};
    pub use crate::context::{
        DiagnosticContext, DiagnosticMap, RequestAttributes, RequestContextHolder, TeardownGuard,
    };
    pub use crate::engine::{CommandDispatcher, PendingCommand};
    pub use crate::errors::{ContextflowError, PluginError};
    pub use crate::logging::{init_logging, LogFormat, LoggingConfig};
    pub use crate::plugins::{
        CommandExecutionHook, ConcurrencyStrategy, ConcurrencyStrategyExt, EventNotifier,
        ExecutionEvent, MetricsPublisher, PluginRegistry, PluginSlot, PluginSnapshot,
        PropertiesStrategy,
    };
    pub use crate::work::{UnitOfWork, WorkError, WorkResult};
    pub use crate::wrappers::{
        build_chain, CapturedContext, ContextWrapper, ContextWrapperExt, DiagnosticContextWrapper,
        RequestAttributesWrapper, SpanContextWrapper, TeardownMode, WrapperChain,
    };
}
