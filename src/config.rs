use anyhow::{Context, Result};
use glam::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_position")]
    pub position: [f32; 3],
    #[serde(default = "CameraConfig::default_target")]
    pub target: [f32; 3],
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
}

impl CameraConfig {
    const fn default_position() -> [f32; 3] {
        [0.0, 1.6, 2.0]
    }

    const fn default_target() -> [f32; 3] {
        [0.0, 1.6, -1.0]
    }

    const fn default_near() -> f32 {
        0.01
    }

    const fn default_far() -> f32 {
        10_000.0
    }

    pub fn position_vec3(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn target_vec3(&self) -> Vec3 {
        Vec3::from_array(self.target)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Self::default_position(),
            target: Self::default_target(),
            near: Self::default_near(),
            far: Self::default_far(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InspectorConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    /// Optional bound on the startup waits (scene load, camera adoption).
    /// `None` preserves the indefinite wait; a value only triggers a logged
    /// warning, never an abort.
    #[serde(default)]
    pub startup_wait_ms: Option<u64>,
}

impl InspectorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("config load error: {err:?}; falling back to defaults");
                Self::default()
            }
        }
    }
}
