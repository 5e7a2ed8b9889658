//! Custom cursor: a dot pinned to the pointer and a ring that lags behind it
//!
//! The ring runs on its own animation loop, independent of physics.

use glam::Vec2;

/// Exponential follower: `F += (T - F) * k` once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorFollower {
    filtered: Vec2,
    target: Vec2,
    smoothing: f32,
}

impl Default for CursorFollower {
    fn default() -> Self {
        Self::new(crate::consts::CURSOR_SMOOTHING)
    }
}

impl CursorFollower {
    /// `smoothing` is clamped into (0, 1)
    pub fn new(smoothing: f32) -> Self {
        Self {
            filtered: Vec2::ZERO,
            target: Vec2::ZERO,
            smoothing: smoothing.clamp(f32::EPSILON, 1.0 - f32::EPSILON),
        }
    }

    /// Latest raw pointer position; earlier targets are simply overwritten
    #[inline]
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }

    pub fn position(&self) -> Vec2 {
        self.filtered
    }

    /// Advance one animation frame and return the new ring position
    pub fn tick(&mut self) -> Vec2 {
        self.filtered += (self.target - self.filtered) * self.smoothing;
        self.filtered
    }
}

/// Cursor visual state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    /// Pointer is over a button, link or close control
    Hover,
}

/// Resolved inline styles for the cursor dot and ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorAppearance {
    pub dot_size: &'static str,
    pub dot_background: &'static str,
    pub ring_transform: &'static str,
    pub ring_border: &'static str,
}

impl CursorStyle {
    pub fn appearance(self) -> CursorAppearance {
        match self {
            CursorStyle::Default => CursorAppearance {
                dot_size: "10px",
                dot_background: "var(--cyan, #00f2ff)",
                ring_transform: "translate(-50%,-50%) scale(1)",
                ring_border: "rgba(0,242,255,.45)",
            },
            CursorStyle::Hover => CursorAppearance {
                dot_size: "18px",
                dot_background: "var(--pink, #ff00e5)",
                ring_transform: "translate(-50%,-50%) scale(1.5)",
                ring_border: "rgba(255,0,229,.4)",
            },
        }
    }
}

/// Counts nested enter/leave pairs so overlapping chrome doesn't flicker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverTracker {
    depth: u32,
}

impl HoverTracker {
    /// Returns the new style if it changed
    pub fn enter(&mut self) -> Option<CursorStyle> {
        self.depth += 1;
        (self.depth == 1).then_some(CursorStyle::Hover)
    }

    /// Returns the new style if it changed
    pub fn leave(&mut self) -> Option<CursorStyle> {
        if self.depth == 0 {
            return None;
        }
        self.depth -= 1;
        (self.depth == 0).then_some(CursorStyle::Default)
    }

    pub fn style(&self) -> CursorStyle {
        if self.depth > 0 {
            CursorStyle::Hover
        } else {
            CursorStyle::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_converges_monotonically_without_overshoot() {
        let target = Vec2::new(100.0, 100.0);
        let mut follower = CursorFollower::new(0.14);
        follower.set_target(target);

        let mut prev = follower.position().distance(target);
        let mut ticks = 0;
        while prev >= 1.0 {
            let p = follower.tick();
            ticks += 1;
            assert!(p.x <= 100.0 && p.y <= 100.0, "overshoot at tick {ticks}: {p}");
            let d = p.distance(target);
            assert!(d < prev);
            prev = d;
            assert!(ticks < 100);
        }
        // 141.42 * 0.86^n < 1  =>  n = 33
        assert_eq!(ticks, 33);
    }

    #[test]
    fn test_latest_target_wins() {
        let mut follower = CursorFollower::new(0.5);
        follower.set_target(Vec2::new(1000.0, 0.0));
        follower.set_target(Vec2::new(-1000.0, 0.0));
        follower.set_target(Vec2::new(10.0, 0.0));
        assert_eq!(follower.tick(), Vec2::new(5.0, 0.0));
        assert_eq!(follower.target(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_hover_styles_differ() {
        assert_ne!(CursorStyle::Default.appearance(), CursorStyle::Hover.appearance());
        assert_eq!(CursorStyle::Hover.appearance().dot_size, "18px");
    }

    #[test]
    fn test_hover_tracker_nesting() {
        let mut hover = HoverTracker::default();
        assert_eq!(hover.enter(), Some(CursorStyle::Hover));
        assert_eq!(hover.enter(), None);
        assert_eq!(hover.leave(), None);
        assert_eq!(hover.style(), CursorStyle::Hover);
        assert_eq!(hover.leave(), Some(CursorStyle::Default));
        assert_eq!(hover.leave(), None);
        assert_eq!(hover.style(), CursorStyle::Default);
    }

    proptest! {
        #[test]
        fn prop_never_overshoots(
            tx in -2000.0f32..2000.0,
            ty in -2000.0f32..2000.0,
            k in 0.01f32..0.99,
            ticks in 1usize..200,
        ) {
            let target = Vec2::new(tx, ty);
            let mut follower = CursorFollower::new(k);
            follower.set_target(target);
            let mut prev = follower.position().distance(target);
            for _ in 0..ticks {
                let p = follower.tick();
                // Stays on the same side of the target on each axis
                prop_assert!(p.x.abs() <= tx.abs() + 1e-3 && p.x * tx >= 0.0);
                prop_assert!(p.y.abs() <= ty.abs() + 1e-3 && p.y * ty >= 0.0);
                let d = p.distance(target);
                prop_assert!(d <= prev + 1e-3);
                prev = d;
            }
        }
    }
}
