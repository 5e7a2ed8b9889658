//! Portfolio Sandbox - project blocks in a 2D physics playground
//!
//! Core modules:
//! - `sim`: Physics capability (trait + rapier2d adapter) and world boundaries
//! - `overlay`: Per-step label synchronization
//! - `pointer`: Pick vs. drag gesture routing
//! - `cursor`: Smoothed cursor ring and hover styling
//! - `scene`: Ties the above together on a fixed timestep
//! - `renderer` / `platform`: Browser canvas and DOM bindings (wasm32 only)

pub mod cursor;
pub mod disclosure;
pub mod overlay;
pub mod pointer;
pub mod projects;
pub mod scene;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod platform;
#[cfg(target_arch = "wasm32")]
pub mod renderer;

pub use projects::ProjectRecord;
pub use scene::{RunState, Scene};
pub use settings::SandboxConfig;

/// Sandbox configuration constants
pub mod consts {
    /// Fixed physics timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per animation frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Longest frame delta accepted (tab switches produce huge gaps)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Pointer travel (px) separating a click from a drag
    pub const DRAG_THRESHOLD: f32 = 5.0;
    /// Cursor ring smoothing per animation frame
    pub const CURSOR_SMOOTHING: f32 = 0.14;
}
