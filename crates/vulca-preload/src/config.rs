//! Preload configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{InteractionKind, PreloadError, Result, RouteKey, RouteLoaderRegistry};

/// Preload scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Longest wait for an idle window before preloading critical routes (ms)
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Routes preloaded once the page goes idle. Empty means every
    /// registered route, in registration order.
    #[serde(default)]
    pub critical_routes: Vec<RouteKey>,

    /// Schedule the idle preload during setup
    #[serde(default = "default_enabled")]
    pub preload_on_idle: bool,

    /// Preload when a pointer moves over a link
    #[serde(default = "default_enabled")]
    pub preload_on_hover: bool,

    /// Preload when a link receives focus
    #[serde(default = "default_enabled")]
    pub preload_on_focus: bool,

    /// Preload when a touch starts on a link
    #[serde(default = "default_enabled")]
    pub preload_on_touch: bool,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: default_idle_timeout_ms(),
            critical_routes: Vec::new(),
            preload_on_idle: default_enabled(),
            preload_on_hover: default_enabled(),
            preload_on_focus: default_enabled(),
            preload_on_touch: default_enabled(),
        }
    }
}

impl PreloadConfig {
    /// Parse a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Idle fallback delay
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Set idle fallback delay, rounded up to whole milliseconds
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        let millis = (timeout.as_nanos() + 999_999) / 1_000_000;
        self.idle_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Set critical routes
    pub fn with_critical_routes<I, K>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<RouteKey>,
    {
        self.critical_routes = routes.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the idle preload
    pub fn with_idle_preload(mut self, enabled: bool) -> Self {
        self.preload_on_idle = enabled;
        self
    }

    /// Interaction kinds that trigger preloads
    pub fn enabled_interactions(&self) -> Vec<InteractionKind> {
        InteractionKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                InteractionKind::PointerOver => self.preload_on_hover,
                InteractionKind::FocusIn => self.preload_on_focus,
                InteractionKind::TouchStart => self.preload_on_touch,
            })
            .collect()
    }

    /// Check the configuration against a registry
    pub fn validate(&self, registry: &RouteLoaderRegistry) -> Result<()> {
        if self.idle_timeout_ms == 0 {
            return Err(PreloadError::Config(
                "idle_timeout_ms must be greater than zero".into(),
            ));
        }

        if let Some(unknown) = self
            .critical_routes
            .iter()
            .find(|key| !registry.contains(key))
        {
            return Err(PreloadError::UnknownRoute(unknown.to_string()));
        }

        Ok(())
    }
}

fn default_idle_timeout_ms() -> u64 {
    crate::DEFAULT_IDLE_TIMEOUT_MS
}

fn default_enabled() -> bool {
    true
}
