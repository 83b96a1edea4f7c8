//! Viewer configuration.
//!
//! Every field has a default, so a partial TOML document (or none at all)
//! yields a usable configuration. Inconsistent values are repaired by
//! [`ViewerConfig::validated`] rather than rejected.

use serde::{Deserialize, Serialize};

use crate::{error::ViewerError, resources::Colour};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Render budget: upper bound of placed elements per session.
    pub max_renderable: usize,
    pub min_fov: f32,
    pub max_fov: f32,
    pub default_fov: f32,
    /// FOV change in degrees per wheel tick or zoom button press.
    pub zoom_step: f32,
    /// Scene rotation in radians per pointer pixel while dragging.
    pub rotate_speed: f32,
    pub camera_position: [f32; 3],
    pub camera_target: [f32; 3],
    pub near: f32,
    pub far: f32,
    pub grid_size: f32,
    pub grid_divisions: u32,
    pub axes_length: f32,
    /// Distance between neighbouring placed elements.
    pub spacing: f32,
    /// Placed elements per row inside one category band.
    pub columns: usize,
    pub highlight_emissive: Colour,
    pub highlight_scale: f32,
    /// Delay before re-checking an unsized container.
    pub init_retry_ms: u64,
    pub clear_colour: Colour,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_renderable: 100,
            min_fov: 10.0,
            max_fov: 100.0,
            default_fov: 75.0,
            zoom_step: 5.0,
            rotate_speed: 0.01,
            camera_position: [10.0, 10.0, 10.0],
            camera_target: [0.0, 0.0, 0.0],
            near: 0.1,
            far: 1000.0,
            grid_size: 20.0,
            grid_divisions: 20,
            axes_length: 5.0,
            spacing: 3.0,
            columns: 10,
            highlight_emissive: Colour(0x444444),
            highlight_scale: 1.2,
            init_retry_ms: 100,
            clear_colour: Colour(0xf0f0f0),
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ViewerError> {
        let config: ViewerConfig = toml::from_str(source)?;
        Ok(config.validated())
    }

    pub fn with_max_renderable(mut self, max_renderable: usize) -> Self {
        self.max_renderable = max_renderable;
        self.validated()
    }

    /// Repair values that would break the engine's invariants.
    pub fn validated(mut self) -> Self {
        if self.max_renderable == 0 {
            log::warn!("max_renderable must be at least 1, using 1");
            self.max_renderable = 1;
        }
        if !(self.min_fov > 0.0) || self.min_fov > self.max_fov || !(self.max_fov < 180.0) {
            log::warn!(
                "invalid FOV range [{}, {}], falling back to [10, 100]",
                self.min_fov,
                self.max_fov
            );
            self.min_fov = 10.0;
            self.max_fov = 100.0;
        }
        let clamped = self.default_fov.clamp(self.min_fov, self.max_fov);
        if clamped != self.default_fov {
            log::warn!(
                "default_fov {} lies outside [{}, {}], using {}",
                self.default_fov,
                self.min_fov,
                self.max_fov,
                clamped
            );
            self.default_fov = clamped;
        }
        if !(self.zoom_step > 0.0) {
            log::warn!("zoom_step must be positive, using 5");
            self.zoom_step = 5.0;
        }
        if self.columns == 0 {
            self.columns = 1;
        }
        if !(self.highlight_scale > 0.0) {
            self.highlight_scale = 1.0;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
            max_renderable = 250
            highlight_emissive = 0xff0000
            "#,
        )
        .unwrap();
        assert_eq!(config.max_renderable, 250);
        assert_eq!(config.highlight_emissive, Colour(0xff0000));
        assert_eq!(config.default_fov, 75.0);
        assert_eq!(config.min_fov, 10.0);
    }

    #[test]
    fn validation_repairs_broken_values() {
        let config = ViewerConfig {
            max_renderable: 0,
            min_fov: 60.0,
            max_fov: 30.0,
            default_fov: 200.0,
            zoom_step: -1.0,
            ..Default::default()
        }
        .validated();
        assert_eq!(config.max_renderable, 1);
        assert_eq!((config.min_fov, config.max_fov), (10.0, 100.0));
        assert_eq!(config.default_fov, 100.0);
        assert_eq!(config.zoom_step, 5.0);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(matches!(
            ViewerConfig::from_toml_str("max_renderable = \"many\""),
            Err(ViewerError::InvalidConfig(_))
        ));
    }
}
