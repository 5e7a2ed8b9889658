//! Sandbox scene: blocks, boundaries, overlay and pointer routing
//!
//! The scene drives the physics world on a fixed timestep and syncs the label
//! overlay after every committed step. Pointer events are hit-tested against
//! the world and fed to the router; its commands are applied here.

use std::rc::Rc;

use glam::Vec2;
use rand::Rng;

use crate::consts::*;
use crate::disclosure::Disclosure;
use crate::overlay::{LabelSink, OverlaySync, SyncReport};
use crate::pointer::{PointerCommand, PointerRouter};
use crate::projects::ProjectRecord;
use crate::settings::SandboxConfig;
use crate::sim::{
    BodyId, BodyTransform, BoundarySide, PhysicsWorld, RectGeometry, SimError, Viewport,
};

/// One project block
#[derive(Debug, Clone)]
pub struct Block {
    pub body: BodyId,
    pub project: Rc<ProjectRecord>,
    pub size: Vec2,
    pub chamfer: f32,
    /// Approximate mass (density × area) for impulse scaling
    pub mass: f32,
}

/// Whether the physics loop is still animating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// A step failed; the scene no longer advances
    Halted,
}

/// Per-frame statistics from [`Scene::advance`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub substeps: u32,
    /// Result of the last overlay sync this frame
    pub sync: SyncReport,
}

pub struct Scene<W: PhysicsWorld> {
    world: W,
    config: SandboxConfig,
    viewport: Viewport,
    boundaries: Vec<(BoundarySide, BodyId)>,
    blocks: Vec<Block>,
    overlay: OverlaySync,
    router: PointerRouter,
    /// Press point in the captured block's local frame
    grab_local: Option<Vec2>,
    accumulator: f32,
    run_state: RunState,
}

impl<W: PhysicsWorld> Scene<W> {
    /// Create boundaries for `viewport` and one block per project
    pub fn new(
        mut world: W,
        config: SandboxConfig,
        projects: &[Rc<ProjectRecord>],
        viewport: Viewport,
    ) -> Self {
        let boundaries = BoundarySide::ALL
            .iter()
            .map(|&side| {
                let geometry = side.geometry(viewport, config.wall_thickness);
                (side, world.create_static_boundary(&geometry))
            })
            .collect();

        let size = config.block_size();
        let blocks: Vec<Block> = projects
            .iter()
            .enumerate()
            .map(|(i, project)| {
                let geometry = RectGeometry::new(config.spawn_position(i), size)
                    .with_chamfer(config.block_chamfer);
                Block {
                    body: world.create_dynamic_body(&geometry, &config.material),
                    project: project.clone(),
                    size,
                    chamfer: geometry.chamfer,
                    mass: config.material.density * size.x * size.y,
                }
            })
            .collect();

        let overlay = OverlaySync::new(blocks.iter().map(|b| b.body).collect());
        let router = PointerRouter::new(config.drag_threshold);

        log::info!(
            "Scene created: {} blocks in {}x{} viewport",
            blocks.len(),
            viewport.width,
            viewport.height
        );

        Self {
            world,
            config,
            viewport,
            boundaries,
            blocks,
            overlay,
            router,
            grab_local: None,
            accumulator: 0.0,
            run_state: RunState::Running,
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn overlay(&self) -> &OverlaySync {
        &self.overlay
    }

    pub fn router(&self) -> &PointerRouter {
        &self.router
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Current transform of block `index`
    pub fn block_transform(&self, index: usize) -> Option<BodyTransform> {
        self.world.transform(self.blocks.get(index)?.body)
    }

    /// Advance by a frame delta (seconds) in fixed substeps, syncing labels
    /// after each committed step.
    ///
    /// A failed step halts the scene and is returned to the caller; later
    /// calls do nothing.
    pub fn advance<S>(&mut self, dt: f32, labels: &mut S) -> Result<FrameStats, SimError>
    where
        S: LabelSink + ?Sized,
    {
        let mut stats = FrameStats::default();
        if self.run_state == RunState::Halted {
            return Ok(stats);
        }

        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { SIM_DT };
        self.accumulator += dt;

        while self.accumulator >= SIM_DT && stats.substeps < MAX_SUBSTEPS {
            if let Err(e) = self.world.step(SIM_DT) {
                self.run_state = RunState::Halted;
                self.world.detach_pointer_constraint();
                return Err(e);
            }
            stats.sync = self.overlay.sync(&self.world, labels);
            self.accumulator -= SIM_DT;
            stats.substeps += 1;
        }

        // Drop backlog we couldn't simulate rather than spiral
        if stats.substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        Ok(stats)
    }

    /// Recompute boundaries for a new viewport. Blocks are not moved and any
    /// gesture in progress continues.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        for &(side, body) in &self.boundaries {
            let geometry = side.geometry(viewport, self.config.wall_thickness);
            if let Err(e) = self.world.reshape_boundary(body, &geometry) {
                log::warn!("Failed to reshape {:?} boundary: {e}", side);
            }
        }
        log::info!("Resized to {}x{}", viewport.width, viewport.height);
    }

    /// Block under `pos`, if any
    pub fn block_at(&self, pos: Vec2) -> Option<usize> {
        let body = self.world.body_at(pos)?;
        self.overlay.label_for(body)
    }

    pub fn pointer_down(&mut self, pos: Vec2) {
        if self.router.captured().is_some() {
            return;
        }
        let hit = self.block_at(pos);
        self.router.pointer_down(pos, hit);
        // The block may move before the drag starts; remember where on it we pressed
        self.grab_local = hit
            .and_then(|block| self.block_transform(block))
            .map(|t| t.to_local(pos));
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        if let Some(cmd) = self.router.pointer_move(pos) {
            self.apply(cmd, None);
        }
    }

    pub fn pointer_up(&mut self, pos: Vec2, disclosure: &mut dyn Disclosure) {
        self.grab_local = None;
        if let Some(cmd) = self.router.pointer_up(pos) {
            self.apply(cmd, Some(disclosure));
        }
    }

    pub fn pointer_cancel(&mut self) {
        self.grab_local = None;
        if let Some(cmd) = self.router.cancel() {
            self.apply(cmd, None);
        }
    }

    fn apply(&mut self, cmd: PointerCommand, disclosure: Option<&mut dyn Disclosure>) {
        match cmd {
            PointerCommand::AttachDrag {
                block,
                grab,
                target,
            } => {
                let Some(body) = self.blocks.get(block).map(|b| b.body) else {
                    return;
                };
                let grab = match (self.grab_local, self.world.transform(body)) {
                    (Some(local), Some(t)) => t.to_world(local),
                    _ => grab,
                };
                let spring = self.config.pointer_spring();
                if let Err(e) = self.world.attach_pointer_constraint(body, grab, target, spring) {
                    log::warn!("Could not start drag on block {block}: {e}");
                }
            }
            PointerCommand::MoveDrag { target } => self.world.move_pointer_constraint(target),
            PointerCommand::ReleaseDrag { .. } => self.world.detach_pointer_constraint(),
            PointerCommand::Pick { block } => {
                if let (Some(b), Some(disclosure)) = (self.blocks.get(block), disclosure) {
                    disclosure.show(b.project.clone());
                }
            }
        }
    }

    /// Kick every block sideways and upward with a random impulse
    pub fn scatter<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for block in &self.blocks {
            let velocity = Vec2::new(
                rng.random_range(-0.5f32..0.5) * self.config.scatter_spread,
                -self.config.scatter_lift,
            );
            if let Err(e) = self.world.apply_impulse(block.body, velocity * block.mass) {
                log::warn!("Scatter skipped {}: {e}", block.body);
            }
        }
    }
}
