//! Physics capability interface
//!
//! The sandbox never integrates or resolves contacts itself. Everything it
//! needs from a rigid-body engine goes through [`PhysicsWorld`]: body creation,
//! stepping, transform reads, hit-testing and a single pointer spring.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// Stable identity of a body inside a [`PhysicsWorld`] (creation order index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl BodyId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BodyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Axis-aligned rectangle in canvas pixels, optionally with rounded corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectGeometry {
    pub center: Vec2,
    pub size: Vec2,
    /// Corner radius (0 for sharp corners)
    pub chamfer: f32,
}

impl RectGeometry {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            size,
            chamfer: 0.0,
        }
    }

    pub fn with_chamfer(mut self, radius: f32) -> Self {
        self.chamfer = radius.max(0.0).min(self.size.min_element() / 2.0);
        self
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.size / 2.0
    }
}

/// Surface response of a dynamic body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    /// Mass per square pixel
    pub density: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.55,
            friction: 0.2,
            density: 1.0,
        }
    }
}

/// Committed position (pixels) and rotation (radians) of a body
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyTransform {
    pub position: Vec2,
    pub angle: f32,
}

impl BodyTransform {
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.angle.is_finite()
    }

    /// Express a world point in this body's local frame
    pub fn to_local(&self, world: Vec2) -> Vec2 {
        Vec2::from_angle(-self.angle).rotate(world - self.position)
    }

    /// Inverse of [`Self::to_local`]
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.position + Vec2::from_angle(self.angle).rotate(local)
    }
}

/// Spring settings for the pointer drag constraint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSpring {
    /// Fraction of the positional error closed per step, in (0, 1]
    pub stiffness: f32,
    /// Fraction of angular velocity removed per step while dragged, in [0, 1]
    pub angular_stiffness: f32,
}

impl Default for PointerSpring {
    fn default() -> Self {
        Self {
            stiffness: 0.18,
            angular_stiffness: 0.2,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(context(suffix(Err)), visibility(pub(crate)))]
pub enum SimError {
    #[snafu(display("Unknown body {id}"))]
    UnknownBody { id: BodyId },

    #[snafu(display("{id} is static and cannot be dragged or pushed"))]
    StaticBody { id: BodyId },

    #[snafu(display("Invalid timestep {dt}"))]
    InvalidTimestep { dt: f32 },

    #[snafu(display("Simulation diverged: {id} has a non-finite transform"))]
    Diverged { id: BodyId },
}

/// External rigid-body engine, as seen by the sandbox
///
/// Body transforms are owned here; callers only ever read them. At most one
/// pointer constraint exists at a time.
pub trait PhysicsWorld {
    /// Create an immovable body (floor or wall)
    fn create_static_boundary(&mut self, geometry: &RectGeometry) -> BodyId;

    /// Move and resize an existing static body, waking any sleeping bodies
    fn reshape_boundary(&mut self, id: BodyId, geometry: &RectGeometry) -> Result<(), SimError>;

    /// Create a body that responds to gravity, contacts and the pointer spring
    fn create_dynamic_body(&mut self, geometry: &RectGeometry, material: &Material) -> BodyId;

    /// Advance the simulation by `dt` seconds. On `Ok`, every transform is
    /// committed and safe to read.
    fn step(&mut self, dt: f32) -> Result<(), SimError>;

    /// Current transform of a body, or `None` if the id is unknown
    fn transform(&self, id: BodyId) -> Option<BodyTransform>;

    /// Topmost dynamic body containing `point`
    fn body_at(&self, point: Vec2) -> Option<BodyId>;

    /// Link `grab` (a world point on the body) to `target` with a spring.
    /// Replaces any constraint already attached.
    fn attach_pointer_constraint(
        &mut self,
        id: BodyId,
        grab: Vec2,
        target: Vec2,
        spring: PointerSpring,
    ) -> Result<(), SimError>;

    /// Retarget the active pointer constraint; no-op when none is attached
    fn move_pointer_constraint(&mut self, target: Vec2);

    /// Release the active pointer constraint; no-op when none is attached
    fn detach_pointer_constraint(&mut self);

    /// Apply an instantaneous impulse at the body's center of mass
    fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) -> Result<(), SimError>;
}
