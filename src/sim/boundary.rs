//! Viewport-derived world boundaries
//!
//! A floor and two side walls sit just outside the visible area so blocks
//! rest on the bottom edge of the screen. The top stays open.

use glam::Vec2;

use super::world::RectGeometry;

/// Visible canvas extent in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }
}

/// Which side of the viewport a boundary guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySide {
    Floor,
    Left,
    Right,
}

impl BoundarySide {
    pub const ALL: [BoundarySide; 3] =
        [BoundarySide::Floor, BoundarySide::Left, BoundarySide::Right];

    /// Geometry of this boundary for a viewport, `thickness` pixels deep
    pub fn geometry(self, viewport: Viewport, thickness: f32) -> RectGeometry {
        let Viewport { width: w, height: h } = viewport;
        let half = thickness / 2.0;
        match self {
            BoundarySide::Floor => {
                RectGeometry::new(Vec2::new(w / 2.0, h + half), Vec2::new(w, thickness))
            }
            BoundarySide::Left => {
                RectGeometry::new(Vec2::new(-half, h / 2.0), Vec2::new(thickness, h))
            }
            BoundarySide::Right => {
                RectGeometry::new(Vec2::new(w + half, h / 2.0), Vec2::new(thickness, h))
            }
        }
    }
}
