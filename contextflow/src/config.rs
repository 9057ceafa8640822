//! Startup configuration.
//!
//! [`WrapperSettings`] carries the enable flag; [`ContextConfiguration`]
//! collects the application's wrappers and performs the one-time
//! registration of the context-aware strategy with the engine.

use crate::concurrency::ContextAwareConcurrencyStrategy;
use crate::errors::ContextflowError;
use crate::plugins::PluginRegistry;
use crate::wrappers::ContextWrapper;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings controlling context propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperSettings {
    /// Whether the context-aware strategy is registered at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for WrapperSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

impl WrapperSettings {
    /// Environment variable read by [`from_env`](Self::from_env).
    pub const ENABLED_ENV: &'static str = "CONTEXTFLOW_WRAPPERS_ENABLED";

    /// Creates settings with defaults (enabled).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates settings with propagation turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Parses settings from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, ContextflowError> {
        serde_json::from_str(json).map_err(|e| ContextflowError::Config(e.to_string()))
    }

    /// Reads settings from the environment, defaulting to enabled when the
    /// variable is unset.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the variable is not a recognised boolean.
    pub fn from_env() -> Result<Self, ContextflowError> {
        match std::env::var(Self::ENABLED_ENV) {
            Ok(raw) => Ok(Self {
                enabled: parse_flag(&raw)?,
            }),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(e) => Err(ContextflowError::Config(format!(
                "{}: {e}",
                Self::ENABLED_ENV
            ))),
        }
    }
}

fn parse_flag(raw: &str) -> Result<bool, ContextflowError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ContextflowError::Config(format!(
            "{} must be a boolean, got '{other}'",
            WrapperSettings::ENABLED_ENV
        ))),
    }
}

/// What the startup registration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationOutcome {
    /// Propagation is turned off; the engine keeps its default strategy.
    Disabled,
    /// No wrappers were supplied; the engine keeps its default strategy.
    NoWrappers,
    /// The context-aware strategy was registered.
    Registered {
        /// Number of wrappers in the registered chain.
        wrappers: usize,
    },
}

/// Collects context wrappers and registers them with the engine once.
pub struct ContextConfiguration {
    settings: WrapperSettings,
    wrappers: Vec<Arc<dyn ContextWrapper>>,
    configured: AtomicBool,
}

impl ContextConfiguration {
    /// Creates a configuration with no wrappers.
    #[must_use]
    pub fn new(settings: WrapperSettings) -> Self {
        Self {
            settings,
            wrappers: Vec::new(),
            configured: AtomicBool::new(false),
        }
    }

    /// Appends a wrapper. Registration order is wrapping order.
    #[must_use]
    pub fn with_wrapper(self, wrapper: impl ContextWrapper + 'static) -> Self {
        self.with_shared_wrapper(Arc::new(wrapper))
    }

    /// Appends an already shared wrapper.
    #[must_use]
    pub fn with_shared_wrapper(mut self, wrapper: Arc<dyn ContextWrapper>) -> Self {
        self.wrappers.push(wrapper);
        self
    }

    /// Returns the settings.
    #[must_use]
    pub fn settings(&self) -> &WrapperSettings {
        &self.settings
    }

    /// Returns the number of collected wrappers.
    #[must_use]
    pub fn wrapper_count(&self) -> usize {
        self.wrappers.len()
    }

    /// Registers the context-aware strategy with `registry`.
    ///
    /// Runs once. Nothing is registered when propagation is disabled or no
    /// wrappers were supplied. Otherwise the registry is reset with its
    /// other four plugins preserved.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyConfigured` on a second call and `Plugin` if the
    /// registry could not be restored; both are fatal at startup.
    pub fn configure(&self, registry: &PluginRegistry) -> Result<ConfigurationOutcome, ContextflowError> {
        if self.configured.swap(true, Ordering::SeqCst) {
            return Err(ContextflowError::AlreadyConfigured);
        }

        if !self.settings.enabled {
            warn!("Context propagation disabled; keeping the engine's concurrency strategy");
            return Ok(ConfigurationOutcome::Disabled);
        }

        if self.wrappers.is_empty() {
            debug!("No context wrappers supplied; keeping the engine's concurrency strategy");
            return Ok(ConfigurationOutcome::NoWrappers);
        }

        let strategy = ContextAwareConcurrencyStrategy::new(self.wrappers.clone());
        let wrappers = strategy.chain().len();
        info!(wrappers = ?strategy.chain().names(), "Registering context-aware concurrency strategy");
        registry.reset_and_register(Arc::new(strategy))?;

        Ok(ConfigurationOutcome::Registered { wrappers })
    }
}

impl fmt::Debug for ContextConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.wrappers.iter().map(|w| w.name()).collect();
        f.debug_struct("ContextConfiguration")
            .field("settings", &self.settings)
            .field("wrappers", &names)
            .field("configured", &self.configured.load(Ordering::SeqCst))
            .finish()
    }
}
