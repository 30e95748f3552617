use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OptimizeError, OptimizeResult};

/// Root configuration. Loaded from an optional TOML file and environment
/// variables with the prefix `GP_OPTIMIZE__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Analytics sink settings, as exposed to the page by the settings screen.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub event_type: SinkKind,
    #[serde(default)]
    pub datalayer_event_name: String,
    #[serde(default = "default_track_previews")]
    pub track_previews: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_container_selector")]
    pub container_selector: String,
    #[serde(default = "default_variant_selector")]
    pub variant_selector: String,
    #[serde(default = "default_storage_key_prefix")]
    pub storage_key_prefix: String,
    #[serde(default = "default_force_variant_param")]
    pub force_variant_param: String,
    #[serde(default)]
    pub inert_policy: InertPolicy,
    #[serde(default = "default_weight")]
    pub default_weight: u32,
}

/// Which analytics sink receives the experiment-started event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Mixpanel,
    Datalayer,
    /// Any unrecognised setting; nothing is emitted.
    #[default]
    #[serde(other)]
    Disabled,
}

/// What happens to a container whose experiment is switched off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InertPolicy {
    /// Show the first declared variant and hide the others.
    #[default]
    ShowFirst,
    /// Leave the container untouched.
    Skip,
}

/// Resolved sink settings handed to the event emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SinkConfig {
    pub kind: SinkKind,
    pub event_name: String,
    pub track_previews: bool,
}

/// Supplies sink settings without reading ambient page globals.
pub trait ConfigProvider: Send + Sync {
    fn sink_config(&self) -> SinkConfig;
}

impl ConfigProvider for AppConfig {
    fn sink_config(&self) -> SinkConfig {
        self.tracking.sink_config()
    }
}

impl ConfigProvider for TrackingConfig {
    fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            kind: self.event_type,
            event_name: self.datalayer_event_name.clone(),
            track_previews: self.track_previews,
        }
    }
}

impl ConfigProvider for SinkConfig {
    fn sink_config(&self) -> SinkConfig {
        self.clone()
    }
}

// Default functions
fn default_track_previews() -> bool {
    true
}
fn default_container_selector() -> String {
    ".gp-optimize-container".to_string()
}
fn default_variant_selector() -> String {
    ".gp-optimize-variant".to_string()
}
fn default_storage_key_prefix() -> String {
    "gp-optimize-".to_string()
}
fn default_force_variant_param() -> String {
    "force_variant".to_string()
}
fn default_weight() -> u32 {
    crate::types::DEFAULT_WEIGHT
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            event_type: SinkKind::default(),
            datalayer_event_name: String::new(),
            track_previews: default_track_previews(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            container_selector: default_container_selector(),
            variant_selector: default_variant_selector(),
            storage_key_prefix: default_storage_key_prefix(),
            force_variant_param: default_force_variant_param(),
            inert_policy: InertPolicy::default(),
            default_weight: default_weight(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment variables.
    pub fn load(file: Option<&Path>) -> OptimizeResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("GP_OPTIMIZE")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| OptimizeError::Config(e.to_string()))
    }
}
