//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default session length and duration presets
//! - Animation scale bounds
//! - Cue sound settings
//! - Driver loop cadence
//! - An optional technique catalog file
//!
//! Configuration is stored at `~/.config/breathwell/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::session::{ScaleBounds, DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE};

/// Session length settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_minutes")]
    pub default_minutes: f64,
    #[serde(default = "default_presets")]
    pub preset_minutes: Vec<u32>,
}

/// Animated value bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    #[serde(default = "default_max_scale")]
    pub max_scale: f64,
}

/// Cue sound configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: f64,
}

/// Driver loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathwell/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON technique catalog used instead of the built-in list.
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub sound: SoundConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

// Default functions
fn default_minutes() -> f64 {
    3.0
}
fn default_presets() -> Vec<u32> {
    vec![1, 2, 3, 5, 10]
}
fn default_min_scale() -> f64 {
    DEFAULT_MIN_SCALE
}
fn default_max_scale() -> f64 {
    DEFAULT_MAX_SCALE
}
fn default_true() -> bool {
    true
}
fn default_volume() -> f64 {
    0.5
}
fn default_frame_interval_ms() -> u64 {
    50
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
            preset_minutes: default_presets(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
        }
    }
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.5,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 50,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: None,
            session: SessionConfig::default(),
            animation: AnimationConfig::default(),
            sound: SoundConfig::default(),
            driver: DriverConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        value
                            .parse::<f64>()
                            .ok()
                            .and_then(serde_json::Number::from_f64)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults first if no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path. See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key. Nothing changes on error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist it.
    ///
    /// # Errors
    ///
    /// See [`Config::apply`]; also fails if the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Reject values the engine or driver cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let minutes = self.session.default_minutes;
        if !(minutes.is_finite() && minutes > 0.0) {
            return Err(invalid(
                "session.default_minutes",
                format!("must be positive, got {minutes}"),
            ));
        }
        if self.session.preset_minutes.contains(&0) {
            return Err(invalid(
                "session.preset_minutes",
                "presets must be at least 1 minute".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.sound.volume) {
            return Err(invalid(
                "sound.volume",
                format!("must be within 0.0..=1.0, got {}", self.sound.volume),
            ));
        }
        self.bounds()?;
        if !(1..=1000).contains(&self.driver.frame_interval_ms) {
            return Err(invalid(
                "driver.frame_interval_ms",
                format!(
                    "must be within 1..=1000, got {}",
                    self.driver.frame_interval_ms
                ),
            ));
        }
        Ok(())
    }

    pub fn bounds(&self) -> Result<ScaleBounds, ConfigError> {
        ScaleBounds::new(self.animation.min_scale, self.animation.max_scale).map_err(|e| {
            ConfigError::InvalidValue {
                key: "animation".into(),
                message: e.to_string(),
            }
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to default configuration");
            Self::default()
        })
    }
}
