//! Engine configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Configuration shared by a facade and the tree algorithms run through it.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct EngineConfig {
    /// Diagnostic name of the facade's operation tracker.
    #[builder(default = "default_name()")]
    #[serde(default = "default_name")]
    pub name: String,

    /// Suffix appended to a directory when `deltree` moves it aside.
    #[builder(default = "default_suffix()")]
    #[serde(default = "default_suffix")]
    pub deltree_suffix: String,

    /// Maximum primitive requests in flight per facade (0 = unlimited).
    #[builder(default = "0")]
    #[serde(default)]
    pub max_concurrent_ops: usize,
}

fn default_name() -> String {
    "fantree".to_string()
}

fn default_suffix() -> String {
    ".old".to_string()
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref suffix) = self.deltree_suffix {
            check_suffix(suffix)?;
        }
        Ok(())
    }
}

fn check_suffix(suffix: &str) -> Result<(), String> {
    if suffix.is_empty() {
        return Err("Deltree suffix cannot be empty".to_string());
    }
    if suffix.contains('/') || suffix.contains(std::path::MAIN_SEPARATOR) {
        return Err(format!("Deltree suffix cannot contain a path separator: {suffix}"));
    }
    Ok(())
}

impl EngineConfig {
    /// Create a new config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse a config from JSON, applying the same validation as the builder.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        check_suffix(&config.deltree_suffix)?;
        Ok(config)
    }

    /// Same config under a different tracker name.
    pub fn named(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            deltree_suffix: default_suffix(),
            max_concurrent_ops: 0,
        }
    }
}
