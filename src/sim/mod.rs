//! Simulation adapter
//!
//! - `world`: the engine-agnostic [`PhysicsWorld`] capability
//! - `rapier`: production implementation on rapier2d
//! - `boundary`: viewport-derived floor and walls

pub mod boundary;
pub mod rapier;
pub mod world;

pub use boundary::{BoundarySide, Viewport};
pub use rapier::RapierWorld;
pub use world::{
    BodyId, BodyTransform, Material, PhysicsWorld, PointerSpring, RectGeometry, SimError,
};
