//! Configuration for the pose viewer

use crate::{Error, Result};
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Output canvas configuration
    pub display: DisplayConfig,

    /// Tick timer configuration
    pub timing: TimingConfig,

    /// Skeleton overlay drawing style
    pub overlay: OverlayConfig,
}

/// Output canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Canvas width in pixels
    pub width: u32,

    /// Canvas height in pixels
    pub height: u32,

    /// Letterbox fill colour
    pub background: [u8; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 720,
            background: [0, 0, 0],
        }
    }
}

impl DisplayConfig {
    pub fn background_rgb(&self) -> Rgb<u8> {
        Rgb(self.background)
    }
}

/// Tick timer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Fixed interval between display ticks
    pub tick_interval_ms: u64,

    /// Minimum delay between two camera open attempts while realtime is active
    pub camera_retry_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 30,
            camera_retry_ms: 1000,
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn camera_retry(&self) -> Duration {
        Duration::from_millis(self.camera_retry_ms)
    }
}

/// Skeleton overlay style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Colour of landmark dots
    pub landmark_color: [u8; 3],

    /// Colour of skeleton connection lines
    pub connection_color: [u8; 3],

    /// Radius of landmark dots in pixels
    pub landmark_radius: i32,

    /// Thickness of connection lines in pixels
    pub connection_thickness: u32,

    /// Landmarks below this visibility are not drawn (0.0-1.0)
    pub min_visibility: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            landmark_color: [255, 0, 0],
            connection_color: [0, 255, 0],
            landmark_radius: 3,
            connection_thickness: 2,
            min_visibility: 0.5,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(Error::Config(format!(
                "Canvas dimensions must be non-zero, got {}x{}",
                self.display.width, self.display.height
            )));
        }
        if self.timing.tick_interval_ms == 0 {
            return Err(Error::Config("Tick interval must be greater than 0".to_string()));
        }
        if self.overlay.landmark_radius < 0 {
            return Err(Error::Config("Landmark radius must not be negative".to_string()));
        }
        if !(0.0..=1.0).contains(&self.overlay.min_visibility) {
            return Err(Error::Config(
                "Minimum visibility must be between 0.0 and 1.0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Pose viewer configuration

# Output canvas
display:
  width: 960
  height: 720
  background: [0, 0, 0]

# Tick timer
timing:
  tick_interval_ms: 30
  camera_retry_ms: 1000

# Skeleton overlay style
overlay:
  landmark_color: [255, 0, 0]
  connection_color: [0, 255, 0]
  landmark_radius: 3
  connection_thickness: 2
  min_visibility: 0.5
"#;
