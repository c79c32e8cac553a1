use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine::{AppPaths, LoopConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub(crate) const CONFIG_ENV_VAR: &str = "DECOR_CONFIG";
pub(crate) const CONFIG_FILE_NAME: &str = "client.json";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse config '{path}' at {at}: {message}")]
    Parse {
        path: PathBuf,
        at: String,
        message: String,
    },
    #[error("invalid config value at {at}: {message}")]
    Invalid { at: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DoorBounds {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl Default for DoorBounds {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ClientConfig {
    pub(crate) target_tps: u32,
    pub(crate) max_ticks_per_frame: u32,
    pub(crate) max_frame_delta_ms: u64,
    pub(crate) pending_action_timeout_ticks: u64,
    pub(crate) door_open_duration_ms: f32,
    pub(crate) fade_out_duration_ms: f32,
    pub(crate) fade_in_duration_ms: f32,
    pub(crate) decor_secondary_offset_ratio: f32,
    pub(crate) door_bounds: DoorBounds,
    pub(crate) decor_extent: f32,
    pub(crate) max_text_len: usize,
    pub(crate) local_identity: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_ticks_per_frame: 5,
            max_frame_delta_ms: 250,
            pending_action_timeout_ticks: 600,
            door_open_duration_ms: 1000.0,
            fade_out_duration_ms: 1000.0,
            fade_in_duration_ms: 250.0,
            decor_secondary_offset_ratio: 0.25,
            door_bounds: DoorBounds::default(),
            decor_extent: 64.0,
            max_text_len: 58,
            local_identity: "local".to_string(),
        }
    }
}

impl ClientConfig {
    pub(crate) fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            target_tps: self.target_tps,
            max_frame_delta: Duration::from_millis(self.max_frame_delta_ms),
            max_ticks_per_frame: self.max_ticks_per_frame,
            ..LoopConfig::default()
        }
    }

    pub(crate) fn parse_json(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config: ClientConfig = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|error| {
                let at = error.path().to_string();
                ConfigError::Parse {
                    path: path.to_path_buf(),
                    at,
                    message: error.into_inner().to_string(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.target_tps == 0 {
            return Err(invalid("target_tps", "expected at least 1, got 0"));
        }
        if self.pending_action_timeout_ticks == 0 {
            return Err(invalid(
                "pending_action_timeout_ticks",
                "expected at least 1, got 0",
            ));
        }
        for (at, value) in [
            ("door_open_duration_ms", self.door_open_duration_ms),
            ("fade_out_duration_ms", self.fade_out_duration_ms),
            ("fade_in_duration_ms", self.fade_in_duration_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(at, format!("expected finite non-negative, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.decor_secondary_offset_ratio) {
            return Err(invalid(
                "decor_secondary_offset_ratio",
                format!(
                    "expected within 0..=1, got {}",
                    self.decor_secondary_offset_ratio
                ),
            ));
        }
        let bounds = self.door_bounds;
        if !(bounds.width > self.decor_extent && bounds.height > self.decor_extent) {
            return Err(invalid(
                "door_bounds",
                format!(
                    "expected width and height larger than decor_extent {}, got {}x{}",
                    self.decor_extent, bounds.width, bounds.height
                ),
            ));
        }
        if self.local_identity.trim().is_empty() {
            return Err(invalid("local_identity", "expected non-empty identity"));
        }
        Ok(())
    }
}

fn invalid(at: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        at,
        message: message.into(),
    }
}

/// `DECOR_CONFIG` when set, otherwise `config/client.json` under the project root.
pub(crate) fn resolve_config_path(app_paths: &AppPaths) -> PathBuf {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => app_paths.config_dir.join(CONFIG_FILE_NAME),
    }
}

/// A missing file yields defaults; a present but broken file is an error.
pub(crate) fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    if !path.is_file() {
        return Ok(ClientConfig::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ClientConfig::parse_json(&raw, path)
}
