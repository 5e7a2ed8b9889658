//! Label overlay synchronization
//!
//! After every physics step each block's label is moved to the block's
//! position and rotated to its angle. No smoothing: labels track bodies at
//! simulation resolution. All transforms are read first, then written in a
//! single pass so DOM writes are never interleaved with reads.

use glam::Vec2;

use crate::sim::{BodyId, BodyTransform, PhysicsWorld};

/// Screen-space placement of one label
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelTransform {
    /// Label center in canvas pixels
    pub position: Vec2,
    pub rotation_deg: f32,
}

impl LabelTransform {
    pub fn from_body(body: &BodyTransform) -> Self {
        Self {
            position: body.position,
            rotation_deg: body.angle.to_degrees(),
        }
    }

    /// CSS `left` value
    pub fn css_left(&self) -> String {
        format!("{}px", self.position.x)
    }

    /// CSS `top` value
    pub fn css_top(&self) -> String {
        format!("{}px", self.position.y)
    }

    /// CSS `transform` that centers the label on its anchor and rotates it
    pub fn css_transform(&self) -> String {
        format!("translate(-50%,-50%) rotate({}deg)", self.rotation_deg)
    }
}

/// A pending write for label `index`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelUpdate {
    pub index: usize,
    pub transform: LabelTransform,
}

/// Destination for label transforms (the DOM overlay in production)
pub trait LabelSink {
    /// Apply one transform. Returns `false` when the label's element no
    /// longer exists; that is not an error.
    fn apply(&mut self, index: usize, transform: &LabelTransform) -> bool;

    /// Apply a whole frame, returning how many labels were written
    fn apply_frame(&mut self, frame: &[LabelUpdate]) -> usize {
        frame
            .iter()
            .filter(|update| self.apply(update.index, &update.transform))
            .count()
    }
}

/// Outcome of one synchronization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub written: usize,
    /// Labels whose element was missing
    pub skipped: usize,
    /// Blocks the physics world no longer knows about
    pub missing_bodies: usize,
}

/// Owns the block → label mapping (label `i` tracks `bodies[i]`)
#[derive(Debug, Clone, Default)]
pub struct OverlaySync {
    bodies: Vec<BodyId>,
    frame: Vec<LabelUpdate>,
}

impl OverlaySync {
    pub fn new(bodies: Vec<BodyId>) -> Self {
        let frame = Vec::with_capacity(bodies.len());
        Self { bodies, frame }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn body(&self, label: usize) -> Option<BodyId> {
        self.bodies.get(label).copied()
    }

    /// Label index tracking `body`
    pub fn label_for(&self, body: BodyId) -> Option<usize> {
        self.bodies.iter().position(|&b| b == body)
    }

    /// The transforms produced by the most recent [`sync`](Self::sync)
    pub fn last_frame(&self) -> &[LabelUpdate] {
        &self.frame
    }

    /// Copy every committed block transform onto its label
    pub fn sync<W, S>(&mut self, world: &W, sink: &mut S) -> SyncReport
    where
        W: PhysicsWorld + ?Sized,
        S: LabelSink + ?Sized,
    {
        self.frame.clear();
        let mut missing_bodies = 0;

        for (index, &body) in self.bodies.iter().enumerate() {
            match world.transform(body) {
                Some(t) => self.frame.push(LabelUpdate {
                    index,
                    transform: LabelTransform::from_body(&t),
                }),
                None => missing_bodies += 1,
            }
        }

        let written = sink.apply_frame(&self.frame);
        let report = SyncReport {
            written,
            skipped: self.frame.len() - written,
            missing_bodies,
        };
        if report.skipped > 0 || report.missing_bodies > 0 {
            log::debug!("Overlay sync incomplete: {:?}", report);
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sim::{Material, RapierWorld, RectGeometry};
    use crate::consts::SIM_DT;
    use std::f32::consts::PI;

    /// In-memory label sink; `None` entries model removed elements
    #[derive(Debug, Default)]
    pub struct RecordingLabels {
        pub labels: Vec<Option<LabelTransform>>,
        pub removed: Vec<bool>,
        pub writes: usize,
    }

    impl RecordingLabels {
        pub fn with_len(n: usize) -> Self {
            Self {
                labels: vec![None; n],
                removed: vec![false; n],
                writes: 0,
            }
        }
    }

    impl LabelSink for RecordingLabels {
        fn apply(&mut self, index: usize, transform: &LabelTransform) -> bool {
            if self.removed.get(index).copied().unwrap_or(true) {
                return false;
            }
            self.labels[index] = Some(*transform);
            self.writes += 1;
            true
        }
    }

    fn spinning_world(n: usize) -> (RapierWorld, Vec<BodyId>) {
        let mut world = RapierWorld::new(Vec2::new(0.0, 1200.0));
        let bodies = (0..n)
            .map(|i| {
                let center = Vec2::new(100.0 + i as f32 * 300.0, 100.0);
                world.create_dynamic_body(
                    &RectGeometry::new(center, Vec2::new(210.0, 90.0)),
                    &Material::default(),
                )
            })
            .collect::<Vec<_>>();
        for &b in &bodies {
            world.apply_impulse(b, Vec2::new(0.0, -50_000.0)).unwrap();
        }
        // Yank the first block by its corner so it spins
        let corner = Vec2::new(100.0 + 105.0, 100.0 + 45.0);
        world
            .attach_pointer_constraint(
                bodies[0],
                corner,
                corner + Vec2::new(400.0, 0.0),
                Default::default(),
            )
            .unwrap();
        (world, bodies)
    }

    #[test]
    fn test_css_strings() {
        let t = LabelTransform {
            position: Vec2::new(12.5, 40.0),
            rotation_deg: 90.0,
        };
        assert_eq!(t.css_left(), "12.5px");
        assert_eq!(t.css_top(), "40px");
        assert_eq!(t.css_transform(), "translate(-50%,-50%) rotate(90deg)");
    }

    #[test]
    fn test_radians_to_degrees() {
        let t = LabelTransform::from_body(&BodyTransform {
            position: Vec2::new(1.0, 2.0),
            angle: PI / 2.0,
        });
        assert!((t.rotation_deg - 90.0).abs() < 1e-4);
        assert_eq!(t.position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_labels_match_bodies_after_every_step() {
        let (mut world, bodies) = spinning_world(3);
        let mut overlay = OverlaySync::new(bodies.clone());
        let mut labels = RecordingLabels::with_len(3);

        for _ in 0..30 {
            world.step(SIM_DT).unwrap();
            let report = overlay.sync(&world, &mut labels);
            assert_eq!(report.written, 3);

            for (i, &body) in bodies.iter().enumerate() {
                let t = world.transform(body).unwrap();
                let label = labels.labels[i].unwrap();
                assert_eq!(label.position, t.position);
                assert!((label.rotation_deg - t.angle * 180.0 / PI).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn test_removed_label_does_not_stop_others() {
        let (mut world, bodies) = spinning_world(3);
        let mut overlay = OverlaySync::new(bodies);
        let mut labels = RecordingLabels::with_len(3);
        labels.removed[1] = true;

        world.step(SIM_DT).unwrap();
        let report = overlay.sync(&world, &mut labels);

        assert_eq!(report, SyncReport { written: 2, skipped: 1, missing_bodies: 0 });
        assert!(labels.labels[0].is_some());
        assert!(labels.labels[1].is_none());
        assert!(labels.labels[2].is_some());
    }

    #[test]
    fn test_unknown_body_is_counted_not_fatal() {
        let (world, mut bodies) = spinning_world(1);
        bodies.push(BodyId(99));
        let mut overlay = OverlaySync::new(bodies);
        let mut labels = RecordingLabels::with_len(2);

        let report = overlay.sync(&world, &mut labels);
        assert_eq!(report.written, 1);
        assert_eq!(report.missing_bodies, 1);
        assert_eq!(overlay.last_frame().len(), 1);
        assert_eq!(overlay.label_for(BodyId(99)), Some(1));
    }
}
