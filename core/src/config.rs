//! Host configuration (`<config dir>/raylink/config.toml`)
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! Command-line flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graphics::MAX_TEXTURE_UNITS;
use crate::input::{InputError, Keymap, VirtualJoystick};
use crate::runtime::DEFAULT_CAMERA_SENSITIVITY;

/// File name inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("ping-pong base unit {base} leaves no second unit below {max}")]
    PingPongUnits { base: u32, max: u32 },

    #[error("window size must be non-zero, got {width}x{height}")]
    WindowSize { width: u32, height: u32 },

    #[error("joystick sensitivity must be finite, got {0}")]
    Sensitivity(f32),

    #[error(transparent)]
    Input(#[from] InputError),
}

/// Host configuration.
///
/// Serialized to/from TOML, one table per section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HostConfig {
    #[serde(default)]
    pub module: ModuleConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Path or http(s) URL of the compiled module (default: raytracer.wasm)
    #[serde(default = "default_module_source")]
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Initial inner width in logical pixels (default: 1280)
    #[serde(default = "default_width")]
    pub width: u32,
    /// Initial inner height in logical pixels (default: 720)
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_true")]
    pub vsync: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RenderConfig {
    /// Render through two offscreen targets and pass the previous frame's
    /// unit to `tick` (default: false)
    #[serde(default)]
    pub ping_pong: bool,
    /// First of the two units reserved for ping-pong (default: 0)
    #[serde(default)]
    pub ping_pong_base_unit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Camera movement per frame at full joystick deflection (default: 0.04)
    #[serde(default = "default_sensitivity")]
    pub joystick_sensitivity: f32,
    /// Outer circle radius in physical pixels (default: 60)
    #[serde(default = "default_joystick_radius")]
    pub joystick_radius: f32,
    /// Distance from the bottom-left corner (default: 24)
    #[serde(default = "default_joystick_margin")]
    pub joystick_margin: f32,
    #[serde(default)]
    pub keymap: Keymap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AssetsConfig {
    /// Where relative texture sources resolve (default: the module's directory)
    #[serde(default)]
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG` (default: info)
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_module_source() -> String {
    "raytracer.wasm".to_string()
}
fn default_title() -> String {
    "raylink".to_string()
}
fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_true() -> bool {
    true
}
fn default_sensitivity() -> f32 {
    DEFAULT_CAMERA_SENSITIVITY
}
fn default_joystick_radius() -> f32 {
    60.0
}
fn default_joystick_margin() -> f32 {
    24.0
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            source: default_module_source(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            vsync: default_true(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            joystick_sensitivity: default_sensitivity(),
            joystick_radius: default_joystick_radius(),
            joystick_margin: default_joystick_margin(),
            keymap: Keymap::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl InputConfig {
    /// Build the configured joystick
    pub fn joystick(&self) -> Result<VirtualJoystick, InputError> {
        VirtualJoystick::new(self.joystick_radius, self.joystick_margin)
    }
}

impl RenderConfig {
    /// Base unit when ping-pong is on
    pub fn ping_pong_base(&self) -> Option<u32> {
        self.ping_pong.then_some(self.ping_pong_base_unit)
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/raylink`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "raylink", "raylink")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

impl HostConfig {
    /// Load and validate the configuration.
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// tried and a missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => {
                    tracing::debug!("No config file, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the configuration as TOML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_error = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_error)?;
        }
        std::fs::write(path, content).map_err(write_error)
    }

    /// Reject values the host cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::WindowSize {
                width: self.window.width,
                height: self.window.height,
            });
        }
        if self.render.ping_pong && self.render.ping_pong_base_unit >= MAX_TEXTURE_UNITS - 1 {
            return Err(ConfigError::PingPongUnits {
                base: self.render.ping_pong_base_unit,
                max: MAX_TEXTURE_UNITS,
            });
        }
        if !self.input.joystick_sensitivity.is_finite() {
            return Err(ConfigError::Sensitivity(self.input.joystick_sensitivity));
        }
        self.input.joystick()?;
        Ok(())
    }
}
