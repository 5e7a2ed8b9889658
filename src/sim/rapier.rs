//! `PhysicsWorld` backed by rapier2d
//!
//! Works directly in canvas pixels with +y pointing down, so gravity is a
//! positive y acceleration and transforms need no conversion for the overlay.

use glam::Vec2;
use rapier2d::prelude::*;
use snafu::{OptionExt, ensure};

use super::world::{
    BodyId, BodyTransform, DivergedErr, InvalidTimestepErr, Material, PhysicsWorld, PointerSpring,
    RectGeometry, SimError, StaticBodyErr, UnknownBodyErr,
};

/// Rapier tolerances are tuned for meters; objects here are ~100 px across
const PIXELS_PER_METER: Real = 100.0;

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    dynamic: bool,
}

#[derive(Debug, Clone, Copy)]
struct PointerConstraint {
    id: BodyId,
    /// Grab point in body-local coordinates
    local_anchor: Point<Real>,
    target: Vec2,
    spring: PointerSpring,
}

pub struct RapierWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    entries: Vec<BodyEntry>,
    pointer: Option<PointerConstraint>,
}

impl RapierWorld {
    /// Create an empty world with the given gravity (px/s², +y is down)
    pub fn new(gravity: Vec2) -> Self {
        let mut params = IntegrationParameters::default();
        params.length_unit = PIXELS_PER_METER;

        Self {
            gravity: vector![gravity.x, gravity.y],
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            entries: Vec::new(),
            pointer: None,
        }
    }

    pub fn has_pointer_constraint(&self) -> bool {
        self.pointer.is_some()
    }

    fn entry(&self, id: BodyId) -> Result<BodyEntry, SimError> {
        self.entries
            .get(id.index())
            .copied()
            .context(UnknownBodyErr { id })
    }

    fn dynamic_entry(&self, id: BodyId) -> Result<BodyEntry, SimError> {
        let entry = self.entry(id)?;
        ensure!(entry.dynamic, StaticBodyErr { id });
        Ok(entry)
    }

    fn insert(&mut self, body: RigidBody, collider: Collider, dynamic: bool) -> BodyId {
        let body = self.bodies.insert(body);
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        let id = BodyId(self.entries.len() as u32);
        self.entries.push(BodyEntry {
            body,
            collider,
            dynamic,
        });
        id
    }

    /// Velocity-level spring: close `stiffness` of the gap between the grab
    /// point and the pointer on this step.
    fn apply_pointer_spring(&mut self, dt: Real) {
        let Some(pointer) = self.pointer else {
            return;
        };
        let Some(handle) = self.entries.get(pointer.id.index()).map(|e| e.body) else {
            self.pointer = None;
            return;
        };
        let Some(rb) = self.bodies.get_mut(handle) else {
            self.pointer = None;
            return;
        };

        let anchor = rb.position() * pointer.local_anchor;
        let target = point![pointer.target.x, pointer.target.y];
        let desired = (target - anchor) * (pointer.spring.stiffness / dt);
        let current = rb.velocity_at_point(&anchor);
        let impulse = (desired - current) * rb.mass();
        rb.apply_impulse_at_point(impulse, anchor, true);

        let damped = rb.angvel() * (1.0 - pointer.spring.angular_stiffness);
        rb.set_angvel(damped, true);
    }
}

fn rect_collider(geometry: &RectGeometry) -> ColliderBuilder {
    let half = geometry.half_extents();
    if geometry.chamfer > 0.0 {
        let r = geometry.chamfer;
        ColliderBuilder::round_cuboid(half.x - r, half.y - r, r)
    } else {
        ColliderBuilder::cuboid(half.x, half.y)
    }
}

impl PhysicsWorld for RapierWorld {
    fn create_static_boundary(&mut self, geometry: &RectGeometry) -> BodyId {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![geometry.center.x, geometry.center.y])
            .build();
        let collider = rect_collider(geometry).build();
        self.insert(body, collider, false)
    }

    fn reshape_boundary(&mut self, id: BodyId, geometry: &RectGeometry) -> Result<(), SimError> {
        let entry = self.entry(id)?;
        if let Some(rb) = self.bodies.get_mut(entry.body) {
            rb.set_translation(vector![geometry.center.x, geometry.center.y], true);
        }
        if let Some(collider) = self.colliders.get_mut(entry.collider) {
            let half = geometry.half_extents();
            collider.set_shape(SharedShape::cuboid(half.x, half.y));
        }
        // Blocks resting on a moved floor must notice it
        for other in self.entries.iter().filter(|e| e.dynamic) {
            if let Some(rb) = self.bodies.get_mut(other.body) {
                rb.wake_up(true);
            }
        }
        Ok(())
    }

    fn create_dynamic_body(&mut self, geometry: &RectGeometry, material: &Material) -> BodyId {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![geometry.center.x, geometry.center.y])
            .ccd_enabled(true)
            .build();
        let collider = rect_collider(geometry)
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .build();
        self.insert(body, collider, true)
    }

    fn step(&mut self, dt: f32) -> Result<(), SimError> {
        ensure!(dt.is_finite() && dt > 0.0, InvalidTimestepErr { dt });

        self.params.dt = dt;
        self.apply_pointer_spring(dt);

        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );

        for index in 0..self.entries.len() {
            let id = BodyId(index as u32);
            let finite = self.transform(id).is_some_and(|t| t.is_finite());
            ensure!(finite, DivergedErr { id });
        }
        Ok(())
    }

    fn transform(&self, id: BodyId) -> Option<BodyTransform> {
        let entry = self.entries.get(id.index())?;
        let rb = self.bodies.get(entry.body)?;
        let translation = rb.translation();
        Some(BodyTransform {
            position: Vec2::new(translation.x, translation.y),
            angle: rb.rotation().angle(),
        })
    }

    fn body_at(&self, point: Vec2) -> Option<BodyId> {
        let point = point![point.x, point.y];
        self.entries
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, e)| e.dynamic)
            .find(|(_, e)| {
                self.colliders
                    .get(e.collider)
                    .is_some_and(|c| c.shape().contains_point(c.position(), &point))
            })
            .map(|(index, _)| BodyId(index as u32))
    }

    fn attach_pointer_constraint(
        &mut self,
        id: BodyId,
        grab: Vec2,
        target: Vec2,
        spring: PointerSpring,
    ) -> Result<(), SimError> {
        let entry = self.dynamic_entry(id)?;
        let rb = self.bodies.get(entry.body).context(UnknownBodyErr { id })?;
        let local_anchor = rb.position().inverse_transform_point(&point![grab.x, grab.y]);

        if let Some(previous) = self.pointer.take() {
            log::debug!("Replacing pointer constraint on {}", previous.id);
        }
        self.pointer = Some(PointerConstraint {
            id,
            local_anchor,
            target,
            spring,
        });
        Ok(())
    }

    fn move_pointer_constraint(&mut self, target: Vec2) {
        if let Some(pointer) = self.pointer.as_mut() {
            pointer.target = target;
        }
    }

    fn detach_pointer_constraint(&mut self) {
        self.pointer = None;
    }

    fn apply_impulse(&mut self, id: BodyId, impulse: Vec2) -> Result<(), SimError> {
        let entry = self.dynamic_entry(id)?;
        let rb = self
            .bodies
            .get_mut(entry.body)
            .context(UnknownBodyErr { id })?;
        rb.apply_impulse(vector![impulse.x, impulse.y], true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;

    fn world_with_floor() -> RapierWorld {
        let mut world = RapierWorld::new(Vec2::new(0.0, 1200.0));
        world.create_static_boundary(&RectGeometry::new(
            Vec2::new(400.0, 625.0),
            Vec2::new(800.0, 50.0),
        ));
        world
    }

    fn block(world: &mut RapierWorld, center: Vec2) -> BodyId {
        world.create_dynamic_body(
            &RectGeometry::new(center, Vec2::new(210.0, 90.0)).with_chamfer(4.0),
            &Material::default(),
        )
    }

    #[test]
    fn test_gravity_pulls_block_down() {
        let mut world = world_with_floor();
        let id = block(&mut world, Vec2::new(400.0, 200.0));
        let start = world.transform(id).unwrap().position;

        for _ in 0..10 {
            world.step(SIM_DT).unwrap();
        }

        let end = world.transform(id).unwrap().position;
        assert!(end.y > start.y, "block should fall: {start} -> {end}");
    }

    #[test]
    fn test_floor_stops_block() {
        let mut world = world_with_floor();
        let id = block(&mut world, Vec2::new(400.0, 400.0));

        for _ in 0..600 {
            world.step(SIM_DT).unwrap();
        }

        let t = world.transform(id).unwrap();
        // Floor top is y=600, block half height 45
        assert!(t.position.y < 600.0, "block fell through floor: {:?}", t);
        assert!(t.position.y > 500.0, "block never landed: {:?}", t);
    }

    #[test]
    fn test_body_at_hits_dynamic_only() {
        let mut world = world_with_floor();
        let id = block(&mut world, Vec2::new(200.0, 200.0));

        assert_eq!(world.body_at(Vec2::new(200.0, 200.0)), Some(id));
        assert_eq!(world.body_at(Vec2::new(290.0, 230.0)), Some(id));
        assert_eq!(world.body_at(Vec2::new(400.0, 200.0)), None);
        // Inside the floor, which is static
        assert_eq!(world.body_at(Vec2::new(400.0, 625.0)), None);
    }

    #[test]
    fn test_pointer_constraint_pulls_toward_target() {
        let mut world = RapierWorld::new(Vec2::ZERO);
        let id = block(&mut world, Vec2::new(100.0, 100.0));
        let target = Vec2::new(300.0, 100.0);

        let spring = PointerSpring::default();
        world
            .attach_pointer_constraint(id, Vec2::new(100.0, 100.0), target, spring)
            .unwrap();
        for _ in 0..120 {
            world.step(SIM_DT).unwrap();
        }

        let pos = world.transform(id).unwrap().position;
        assert!(pos.distance(target) < 5.0, "block at {pos}, expected near {target}");

        world.detach_pointer_constraint();
        assert!(!world.has_pointer_constraint());
    }

    #[test]
    fn test_attach_replaces_previous_constraint() {
        let mut world = RapierWorld::new(Vec2::ZERO);
        let a = block(&mut world, Vec2::new(100.0, 100.0));
        let b = block(&mut world, Vec2::new(500.0, 100.0));
        let spring = PointerSpring::default();

        world
            .attach_pointer_constraint(a, Vec2::new(100.0, 100.0), Vec2::new(100.0, 300.0), spring)
            .unwrap();
        world
            .attach_pointer_constraint(b, Vec2::new(500.0, 100.0), Vec2::new(500.0, 300.0), spring)
            .unwrap();
        for _ in 0..60 {
            world.step(SIM_DT).unwrap();
        }

        // Only b is pulled; a stays put with zero gravity
        assert!((world.transform(a).unwrap().position.y - 100.0).abs() < 0.5);
        assert!(world.transform(b).unwrap().position.y > 250.0);
    }

    #[test]
    fn test_static_bodies_reject_drag_and_impulse() {
        let mut world = world_with_floor();
        let floor = BodyId(0);
        let spring = PointerSpring::default();
        assert!(matches!(
            world.attach_pointer_constraint(floor, Vec2::ZERO, Vec2::ZERO, spring),
            Err(SimError::StaticBody { .. })
        ));
        assert!(matches!(
            world.apply_impulse(floor, Vec2::Y),
            Err(SimError::StaticBody { .. })
        ));
        assert!(matches!(
            world.apply_impulse(BodyId(42), Vec2::Y),
            Err(SimError::UnknownBody { .. })
        ));
    }

    #[test]
    fn test_invalid_timestep_is_error() {
        let mut world = world_with_floor();
        assert!(matches!(world.step(0.0), Err(SimError::InvalidTimestep { .. })));
        assert!(matches!(world.step(f32::NAN), Err(SimError::InvalidTimestep { .. })));
    }

    #[test]
    fn test_non_finite_body_reports_divergence() {
        let mut world = world_with_floor();
        let healthy = block(&mut world, Vec2::new(400.0, 200.0));

        // Collider-less body so the broad phase never sees the NaN
        let body = world.bodies.insert(
            RigidBodyBuilder::dynamic()
                .translation(vector![f32::NAN, 100.0])
                .build(),
        );
        let bad = BodyId(world.entries.len() as u32);
        world.entries.push(BodyEntry {
            body,
            collider: ColliderHandle::invalid(),
            dynamic: true,
        });

        match world.step(SIM_DT) {
            Err(SimError::Diverged { id }) => assert_eq!(id, bad),
            other => panic!("expected divergence, got {other:?}"),
        }
        assert!(world.transform(healthy).unwrap().is_finite());
    }

    #[test]
    fn test_reshape_boundary_moves_floor() {
        let mut world = world_with_floor();
        let floor = BodyId(0);
        let wider = RectGeometry::new(Vec2::new(600.0, 925.0), Vec2::new(1200.0, 50.0));
        world.reshape_boundary(floor, &wider).unwrap();
        assert_eq!(world.transform(floor).unwrap().position, Vec2::new(600.0, 925.0));

        let unknown = RectGeometry::new(Vec2::ZERO, Vec2::ONE);
        assert!(world.reshape_boundary(BodyId(9), &unknown).is_err());
    }
}
