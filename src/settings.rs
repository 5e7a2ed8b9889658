//! Sandbox tuning
//!
//! Read once at startup from an optional inline JSON block on the page.
//! Nothing is persisted; missing fields fall back to the defaults below.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu, ensure};

use crate::consts::{CURSOR_SMOOTHING, DRAG_THRESHOLD};
use crate::sim::{Material, PointerSpring};

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)))]
pub enum ConfigError {
    #[snafu(display("Sandbox config is not valid JSON: {source}"))]
    Parse { source: serde_json::Error },

    #[snafu(display("Config field '{field}' is out of range: {value}"))]
    OutOfRange { field: &'static str, value: f32 },
}

/// Physics, gesture and cursor tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Gravity acceleration (px/s², +y is down)
    pub gravity: Vec2,

    // === Blocks ===
    pub block_width: f32,
    pub block_height: f32,
    pub block_chamfer: f32,
    /// Center of the first block
    pub spawn_origin: Vec2,
    /// Horizontal distance between block centers
    pub spawn_spacing: f32,
    pub material: Material,

    // === Boundaries ===
    pub wall_thickness: f32,

    // === Pointer ===
    /// Pointer travel (px) that turns a press into a drag
    pub drag_threshold: f32,
    pub pointer_stiffness: f32,
    pub pointer_angular_stiffness: f32,

    // === Cursor ===
    /// Ring smoothing coefficient, in (0, 1)
    pub cursor_smoothing: f32,

    // === Scatter ===
    /// Peak horizontal impulse per unit mass (px/s)
    pub scatter_spread: f32,
    /// Upward impulse per unit mass (px/s)
    pub scatter_lift: f32,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, 1200.0),

            block_width: 210.0,
            block_height: 90.0,
            block_chamfer: 4.0,
            spawn_origin: Vec2::new(180.0, 220.0),
            spawn_spacing: 340.0,
            material: Material::default(),

            wall_thickness: 50.0,

            drag_threshold: DRAG_THRESHOLD,
            pointer_stiffness: 0.18,
            pointer_angular_stiffness: 0.2,

            cursor_smoothing: CURSOR_SMOOTHING,

            scatter_spread: 480.0,
            scatter_lift: 720.0,
        }
    }
}

impl SandboxConfig {
    /// Inline `<script type="application/json">` id holding overrides
    pub const ELEMENT_ID: &'static str = "sandbox-config";

    /// Parse and validate a JSON override
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).context(ParseErr)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("block_width", self.block_width),
            ("block_height", self.block_height),
            ("wall_thickness", self.wall_thickness),
            ("spawn_spacing", self.spawn_spacing),
            ("material.density", self.material.density),
        ];
        for (field, value) in positive {
            ensure!(value.is_finite() && value > 0.0, OutOfRangeErr { field, value });
        }

        let non_negative = [
            ("block_chamfer", self.block_chamfer),
            ("material.restitution", self.material.restitution),
            ("material.friction", self.material.friction),
            ("scatter_spread", self.scatter_spread),
            ("scatter_lift", self.scatter_lift),
        ];
        for (field, value) in non_negative {
            ensure!(value.is_finite() && value >= 0.0, OutOfRangeErr { field, value });
        }

        ensure!(
            self.spawn_origin.is_finite(),
            OutOfRangeErr {
                field: "spawn_origin",
                value: self.spawn_origin.length()
            }
        );

        ensure!(
            self.cursor_smoothing > 0.0 && self.cursor_smoothing < 1.0,
            OutOfRangeErr {
                field: "cursor_smoothing",
                value: self.cursor_smoothing
            }
        );
        ensure!(
            self.pointer_stiffness > 0.0 && self.pointer_stiffness <= 1.0,
            OutOfRangeErr {
                field: "pointer_stiffness",
                value: self.pointer_stiffness
            }
        );
        ensure!(
            (0.0..=1.0).contains(&self.pointer_angular_stiffness),
            OutOfRangeErr {
                field: "pointer_angular_stiffness",
                value: self.pointer_angular_stiffness
            }
        );
        ensure!(
            self.drag_threshold.is_finite() && self.drag_threshold >= 0.0,
            OutOfRangeErr {
                field: "drag_threshold",
                value: self.drag_threshold
            }
        );
        ensure!(
            self.gravity.is_finite(),
            OutOfRangeErr {
                field: "gravity",
                value: self.gravity.length()
            }
        );
        Ok(())
    }

    pub fn block_size(&self) -> Vec2 {
        Vec2::new(self.block_width, self.block_height)
    }

    /// Center of block `index` at spawn time
    pub fn spawn_position(&self, index: usize) -> Vec2 {
        self.spawn_origin + Vec2::new(index as f32 * self.spawn_spacing, 0.0)
    }

    pub fn pointer_spring(&self) -> PointerSpring {
        PointerSpring {
            stiffness: self.pointer_stiffness,
            angular_stiffness: self.pointer_angular_stiffness,
        }
    }

    /// Load overrides from the page, falling back to defaults (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let text = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(Self::ELEMENT_ID))
            .and_then(|el| el.text_content());

        if let Some(json) = text {
            match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded sandbox config from #{}", Self::ELEMENT_ID);
                    return config;
                }
                Err(e) => log::warn!("Ignoring sandbox config: {e}"),
            }
        }

        log::info!("Using default sandbox config");
        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SandboxConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = SandboxConfig::from_json(r#"{"drag_threshold": 8.0}"#).unwrap();
        assert_eq!(config.drag_threshold, 8.0);
        assert_eq!(config.cursor_smoothing, 0.14);
        assert_eq!(config.block_size(), Vec2::new(210.0, 90.0));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = SandboxConfig::from_json(r#"{"cursor_smoothing": 1.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "cursor_smoothing", .. }));

        let err = SandboxConfig::from_json(r#"{"pointer_stiffness": 0.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "pointer_stiffness", .. }));

        let err = SandboxConfig::from_json(r#"{"block_width": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "block_width", .. }));

        assert!(matches!(
            SandboxConfig::from_json("not json"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_massless_material_rejected() {
        let err = SandboxConfig::from_json(
            r#"{"material": {"restitution": 0.5, "friction": 0.2, "density": 0.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "material.density", .. }));

        let err = SandboxConfig::from_json(
            r#"{"material": {"restitution": -0.1, "friction": 0.2, "density": 1.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "material.restitution", .. }));

        let err = SandboxConfig::from_json(
            r#"{"material": {"restitution": 0.5, "friction": -1.0, "density": 1.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "material.friction", .. }));
    }

    #[test]
    fn test_non_finite_placement_rejected() {
        // 1e39 overflows f32 to infinity
        let err = SandboxConfig::from_json(r#"{"spawn_origin": [1e39, 220]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "spawn_origin", .. }));

        let err = SandboxConfig::from_json(r#"{"block_chamfer": -4}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "block_chamfer", .. }));

        let err = SandboxConfig::from_json(r#"{"scatter_lift": -1}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "scatter_lift", .. }));

        let mut config = SandboxConfig::default();
        config.scatter_spread = f32::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "scatter_spread", .. })
        ));
    }

    #[test]
    fn test_spawn_positions_follow_spacing() {
        let config = SandboxConfig::default();
        assert_eq!(config.spawn_position(0), Vec2::new(180.0, 220.0));
        assert_eq!(config.spawn_position(2), Vec2::new(860.0, 220.0));
    }
}
