//! Pointer gesture routing
//!
//! Turns raw press/move/release events into semantic commands:
//! a press-release over a block without travel is a pick, a press followed
//! by travel past the drag threshold is a drag. The block under the pointer
//! at press time is latched as the only target until release.

use glam::Vec2;

/// Gesture state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    /// No button held over a block
    Idle,
    /// Pressed over `block`, travel still within the threshold
    Tracking { block: usize, down: Vec2 },
    /// Travel exceeded the threshold; `block` follows the pointer
    Dragging { block: usize },
}

/// What the router wants done in response to an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerCommand {
    /// Attach the drag spring: `grab` is where the block was pressed
    AttachDrag { block: usize, grab: Vec2, target: Vec2 },
    /// Retarget the drag spring
    MoveDrag { target: Vec2 },
    /// Release the drag spring
    ReleaseDrag { block: usize },
    /// Open the detail view for `block`
    Pick { block: usize },
}

#[derive(Debug, Clone)]
pub struct PointerRouter {
    state: GestureState,
    threshold: f32,
}

impl Default for PointerRouter {
    fn default() -> Self {
        Self::new(crate::consts::DRAG_THRESHOLD)
    }
}

impl PointerRouter {
    pub fn new(threshold: f32) -> Self {
        Self {
            state: GestureState::Idle,
            threshold: threshold.max(0.0),
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Block currently captured by the gesture, if any
    pub fn captured(&self) -> Option<usize> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Tracking { block, .. } | GestureState::Dragging { block } => Some(block),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    /// Press at `pos`; `hit` is the block under the pointer.
    ///
    /// Ignored while a gesture is already in progress.
    pub fn pointer_down(&mut self, pos: Vec2, hit: Option<usize>) {
        if self.state != GestureState::Idle {
            return;
        }
        if let Some(block) = hit {
            self.state = GestureState::Tracking { block, down: pos };
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) -> Option<PointerCommand> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Tracking { block, down } => {
                if pos.distance(down) > self.threshold {
                    self.state = GestureState::Dragging { block };
                    Some(PointerCommand::AttachDrag {
                        block,
                        grab: down,
                        target: pos,
                    })
                } else {
                    None
                }
            }
            GestureState::Dragging { .. } => Some(PointerCommand::MoveDrag { target: pos }),
        }
    }

    pub fn pointer_up(&mut self, pos: Vec2) -> Option<PointerCommand> {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        match state {
            GestureState::Idle => None,
            // Travel without an intervening move event still disqualifies a pick
            GestureState::Tracking { block, down } => (pos.distance(down) <= self.threshold)
                .then_some(PointerCommand::Pick { block }),
            GestureState::Dragging { block } => Some(PointerCommand::ReleaseDrag { block }),
        }
    }

    /// Abort the gesture (pointer left the surface, window lost focus)
    pub fn cancel(&mut self) -> Option<PointerCommand> {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        match state {
            GestureState::Dragging { block } => Some(PointerCommand::ReleaseDrag { block }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const A: usize = 0;
    const B: usize = 1;

    #[test]
    fn test_click_without_travel_picks() {
        let mut router = PointerRouter::new(5.0);
        router.pointer_down(Vec2::new(10.0, 10.0), Some(A));
        assert_eq!(
            router.pointer_up(Vec2::new(10.0, 10.0)),
            Some(PointerCommand::Pick { block: A })
        );
        assert_eq!(router.state(), GestureState::Idle);
    }

    #[test]
    fn test_jitter_within_threshold_still_picks() {
        let mut router = PointerRouter::new(5.0);
        router.pointer_down(Vec2::ZERO, Some(A));
        assert_eq!(router.pointer_move(Vec2::new(3.0, 4.0)), None); // exactly 5px
        assert_eq!(router.pointer_move(Vec2::new(-2.0, 1.0)), None);
        assert_eq!(router.pointer_up(Vec2::new(1.0, 1.0)), Some(PointerCommand::Pick { block: A }));
    }

    #[test]
    fn test_drag_attaches_then_releases_without_pick() {
        let mut router = PointerRouter::new(5.0);
        router.pointer_down(Vec2::ZERO, Some(A));

        assert_eq!(
            router.pointer_move(Vec2::new(6.0, 0.0)),
            Some(PointerCommand::AttachDrag {
                block: A,
                grab: Vec2::ZERO,
                target: Vec2::new(6.0, 0.0)
            })
        );
        assert_eq!(
            router.pointer_move(Vec2::new(50.0, 20.0)),
            Some(PointerCommand::MoveDrag { target: Vec2::new(50.0, 20.0) })
        );
        // Coming back near the start does not turn it back into a click
        assert_eq!(
            router.pointer_move(Vec2::ZERO),
            Some(PointerCommand::MoveDrag { target: Vec2::ZERO })
        );
        assert_eq!(router.pointer_up(Vec2::ZERO), Some(PointerCommand::ReleaseDrag { block: A }));
        assert_eq!(router.state(), GestureState::Idle);
    }

    #[test]
    fn test_press_on_empty_space_passes_through() {
        let mut router = PointerRouter::new(5.0);
        router.pointer_down(Vec2::ZERO, None);
        assert_eq!(router.state(), GestureState::Idle);
        assert_eq!(router.pointer_move(Vec2::new(100.0, 0.0)), None);
        assert_eq!(router.pointer_up(Vec2::new(100.0, 0.0)), None);
    }

    #[test]
    fn test_capture_is_latched_at_press() {
        let mut router = PointerRouter::new(5.0);
        router.pointer_down(Vec2::ZERO, Some(A));
        router.pointer_down(Vec2::new(300.0, 0.0), Some(B));
        assert_eq!(router.captured(), Some(A));

        router.pointer_move(Vec2::new(300.0, 0.0));
        router.pointer_down(Vec2::new(300.0, 0.0), Some(B));
        assert_eq!(router.captured(), Some(A));
        assert_eq!(
            router.pointer_up(Vec2::new(300.0, 0.0)),
            Some(PointerCommand::ReleaseDrag { block: A })
        );
    }

    #[test]
    fn test_release_far_away_without_moves_is_not_a_pick() {
        let mut router = PointerRouter::new(5.0);
        router.pointer_down(Vec2::ZERO, Some(A));
        assert_eq!(router.pointer_up(Vec2::new(40.0, 0.0)), None);
    }

    #[test]
    fn test_cancel_releases_drag_and_suppresses_pick() {
        let mut router = PointerRouter::new(5.0);
        router.pointer_down(Vec2::ZERO, Some(A));
        assert_eq!(router.cancel(), None);
        assert_eq!(router.pointer_up(Vec2::ZERO), None);

        router.pointer_down(Vec2::ZERO, Some(B));
        router.pointer_move(Vec2::new(20.0, 0.0));
        assert_eq!(router.cancel(), Some(PointerCommand::ReleaseDrag { block: B }));
        assert_eq!(router.state(), GestureState::Idle);
    }

    #[derive(Debug, Clone)]
    enum Event {
        Down(f32, f32, Option<usize>),
        Move(f32, f32),
        Up(f32, f32),
        Cancel,
    }

    fn event() -> impl Strategy<Value = Event> {
        let coord = -50.0f32..50.0;
        prop_oneof![
            (coord.clone(), coord.clone(), proptest::option::of(0usize..3))
                .prop_map(|(x, y, hit)| Event::Down(x, y, hit)),
            (coord.clone(), coord.clone()).prop_map(|(x, y)| Event::Move(x, y)),
            (coord.clone(), coord).prop_map(|(x, y)| Event::Up(x, y)),
            Just(Event::Cancel),
        ]
    }

    proptest! {
        #[test]
        fn prop_drag_spring_balanced(events in proptest::collection::vec(event(), 0..64)) {
            let mut router = PointerRouter::new(5.0);
            let mut attached: i32 = 0;

            for e in events {
                let before = router.captured();
                let cmd = match e {
                    Event::Down(x, y, hit) => { router.pointer_down(Vec2::new(x, y), hit); None }
                    Event::Move(x, y) => router.pointer_move(Vec2::new(x, y)),
                    Event::Up(x, y) => router.pointer_up(Vec2::new(x, y)),
                    Event::Cancel => router.cancel(),
                };
                match cmd {
                    Some(PointerCommand::AttachDrag { block, .. }) => {
                        prop_assert_eq!(Some(block), before);
                        attached += 1;
                    }
                    Some(PointerCommand::ReleaseDrag { block }) => {
                        prop_assert_eq!(Some(block), before);
                        attached -= 1;
                    }
                    Some(PointerCommand::Pick { block }) => {
                        prop_assert_eq!(Some(block), before);
                        prop_assert_eq!(attached, 0);
                    }
                    Some(PointerCommand::MoveDrag { .. }) => prop_assert_eq!(attached, 1),
                    None => {}
                }
                prop_assert!(attached == 0 || attached == 1);
                prop_assert_eq!(attached == 1, router.is_dragging());
            }
        }

        #[test]
        fn prop_small_travel_always_picks(
            moves in proptest::collection::vec((-3.5f32..3.5, -3.5f32..3.5), 0..16),
        ) {
            let mut router = PointerRouter::new(5.0);
            router.pointer_down(Vec2::ZERO, Some(2));
            for (x, y) in moves {
                prop_assert_eq!(router.pointer_move(Vec2::new(x, y)), None);
            }
            prop_assert_eq!(router.pointer_up(Vec2::ZERO), Some(PointerCommand::Pick { block: 2 }));
        }
    }
}
