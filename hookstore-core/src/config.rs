//! Store Configuration
//!
//! Each store carries a small configuration: a display name used in logs and
//! error messages, and the timing policy for the post-commit phase.
//!
//! Configuration can be built in code or loaded from JSON:
//!
//! ```rust
//! use hookstore_core::{EffectTiming, StoreConfig};
//!
//! let config = StoreConfig::from_json(r#"{ "name": "counter", "effect_timing": "passive" }"#)
//!     .unwrap();
//! assert_eq!(config.name, "counter");
//! assert_eq!(config.effect_timing, EffectTiming::Passive);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// When a producer runs its post-commit phase (stable callback commit and
/// subscriber notification).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTiming {
    /// Run the post-commit phase as the last step of `Producer::update`.
    #[default]
    Layout,

    /// Leave the post-commit phase pending until the host calls
    /// `Producer::flush_effects`.
    Passive,
}

/// Per-store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Display name used in tracing fields and error messages.
    pub name: String,

    /// Post-commit phase timing.
    pub effect_timing: EffectTiming,
}

impl StoreConfig {
    /// Create a configuration with the given name and default timing.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the effect timing.
    pub fn with_effect_timing(mut self, timing: EffectTiming) -> Self {
        self.effect_timing = timing;
        self
    }

    /// Parse a configuration from a JSON document. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            effect_timing: EffectTiming::Layout,
        }
    }
}
