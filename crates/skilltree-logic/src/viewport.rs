//! Viewport transform - pan offset, zoom scale, and pointer hit-testing.
//!
//! ```text
//! screen = world * scale + offset
//! world  = (screen - offset) / scale
//! ```
//!
//! Zooming is anchored: the world point under the pointer stays under the
//! pointer. The controller is either idle or dragging; dragging moves the
//! offset by the pointer delta.
//!
//! ```
//! use skilltree_logic::config::ViewportConfig;
//! use skilltree_logic::viewport::{Point, Viewport};
//!
//! let mut vp = Viewport::new(&ViewportConfig::default());
//! let pointer = Point::new(300.0, 200.0);
//! let before = vp.screen_to_world(pointer);
//! vp.zoom_at(pointer, 2.0);
//! let after = vp.screen_to_world(pointer);
//! assert!((before.x - after.x).abs() < 1e-3 && (before.y - after.y).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ViewportConfig;

/// A 2D point, in screen or world space depending on context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Persisted pan/zoom state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportState {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    /// Last pointer position seen while the button is held.
    Dragging { last: Point },
}

/// Pan/zoom controller with clamped scale.
#[derive(Debug, Clone)]
pub struct Viewport {
    state: ViewportState,
    drag: DragState,
    min_scale: f32,
    max_scale: f32,
    zoom_step: f32,
}

impl Viewport {
    /// Viewport at the configured initial state.
    pub fn new(config: &ViewportConfig) -> Self {
        Self::with_state(config, config.initial)
    }

    /// Viewport restored from a saved state; bad values are repaired.
    pub fn with_state(config: &ViewportConfig, state: ViewportState) -> Self {
        let mut vp = Self {
            state: config.initial,
            drag: DragState::Idle,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_step: config.zoom_step,
        };
        vp.restore(state);
        vp
    }

    /// Replace the state, clamping scale and rejecting non-finite values.
    pub fn restore(&mut self, state: ViewportState) {
        if !(state.offset_x.is_finite() && state.offset_y.is_finite() && state.scale.is_finite())
            || state.scale <= 0.0
        {
            log::warn!("Ignoring invalid viewport state {:?}", state);
            self.state.scale = self.clamp_scale(self.state.scale);
            return;
        }
        self.state = ViewportState {
            scale: self.clamp_scale(state.scale),
            ..state
        };
        self.drag = DragState::Idle;
    }

    fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn scale(&self) -> f32 {
        self.state.scale
    }

    pub fn offset(&self) -> Point {
        Point::new(self.state.offset_x, self.state.offset_y)
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    /// Idle → dragging, anchored at `at`.
    pub fn pointer_down(&mut self, at: Point) {
        self.drag = DragState::Dragging { last: at };
    }

    /// Pans by the pointer delta while dragging. Returns true if the offset moved.
    pub fn pointer_move(&mut self, to: Point) -> bool {
        let DragState::Dragging { last } = self.drag else {
            return false;
        };
        self.drag = DragState::Dragging { last: to };
        self.pan(to.x - last.x, to.y - last.y)
    }

    /// Dragging → idle. Returns true if a drag was in progress.
    pub fn pointer_up(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.drag = DragState::Idle;
        was_dragging
    }

    /// Shift the offset. Returns true if it moved; non-finite deltas are
    /// ignored.
    pub fn pan(&mut self, dx: f32, dy: f32) -> bool {
        if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.state.offset_x += dx;
        self.state.offset_y += dy;
        true
    }

    /// Scale by `factor` about `pointer`, clamped to the scale bounds.
    ///
    /// Returns true if the scale changed. The anchor uses the clamped ratio,
    /// so the world point under the pointer holds even at the bounds.
    pub fn zoom_at(&mut self, pointer: Point, factor: f32) -> bool {
        if !(factor.is_finite() && factor > 0.0) {
            return false;
        }
        let old = self.state.scale;
        let new = self.clamp_scale(old * factor);
        if new == old {
            return false;
        }
        let ratio = new / old;
        self.state.offset_x = pointer.x - (pointer.x - self.state.offset_x) * ratio;
        self.state.offset_y = pointer.y - (pointer.y - self.state.offset_y) * ratio;
        self.state.scale = new;
        true
    }

    /// Wheel zoom: positive notches zoom in by `zoom_step` each.
    pub fn wheel(&mut self, pointer: Point, notches: f32) -> bool {
        self.zoom_at(pointer, self.zoom_step.powf(notches))
    }

    /// One explicit zoom step in (`+1`) or out (`-1`) about `center`.
    pub fn zoom_step(&mut self, center: Point, direction: i32) -> bool {
        self.zoom_at(center, self.zoom_step.powi(direction.signum()))
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.state.offset_x) / self.state.scale,
            (screen.y - self.state.offset_y) / self.state.scale,
        )
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.state.scale + self.state.offset_x,
            world.y * self.state.scale + self.state.offset_y,
        )
    }
}

/// A hit-testable node: id, world-space center, world-space radius.
#[derive(Debug, Clone, Copy)]
pub struct HitTarget<'a> {
    pub id: &'a str,
    pub center: Point,
    pub radius: f32,
}

/// Nearest target whose circle contains `world`.
pub fn hit_test<'a, I>(targets: I, world: Point) -> Option<&'a str>
where
    I: IntoIterator<Item = HitTarget<'a>>,
{
    let mut best: Option<(&'a str, f32)> = None;
    for target in targets {
        let d = target.center.distance(world);
        if d > target.radius {
            continue;
        }
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((target.id, d));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn viewport() -> Viewport {
        Viewport::new(&ViewportConfig::default())
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    #[test]
    fn identity_transform() {
        let vp = viewport();
        let p = Point::new(12.0, -7.5);
        assert!(close(vp.screen_to_world(p), p));
    }

    #[test]
    fn pan_ignores_non_finite_and_zero() {
        let mut vp = viewport();
        assert!(!vp.pan(f32::NAN, 1.0));
        assert!(!vp.pan(1.0, f32::INFINITY));
        assert!(!vp.pan(0.0, 0.0));
        assert_eq!(vp.offset(), Point::new(0.0, 0.0));
        assert!(vp.pan(3.0, -2.0));
        assert_eq!(vp.offset(), Point::new(3.0, -2.0));
    }

    #[test]
    fn screen_world_inverse() {
        let mut vp = viewport();
        vp.pan(100.0, 50.0);
        vp.zoom_at(Point::new(0.0, 0.0), 2.0);
        let w = Point::new(33.0, 44.0);
        assert!(close(vp.screen_to_world(vp.world_to_screen(w)), w));
    }

    #[test]
    fn zoom_anchor_holds() {
        let mut vp = viewport();
        vp.pan(-40.0, 25.0);
        for (p, f) in [
            (Point::new(300.0, 200.0), 1.1),
            (Point::new(-5.0, 800.0), 0.5),
            (Point::new(640.0, 360.0), 1.7),
        ] {
            let before = vp.screen_to_world(p);
            vp.zoom_at(p, f);
            assert!(close(before, vp.screen_to_world(p)));
        }
    }

    #[test]
    fn zoom_anchor_holds_when_clamped() {
        let mut vp = viewport();
        let p = Point::new(200.0, 120.0);
        let before = vp.screen_to_world(p);
        assert!(vp.zoom_at(p, 100.0));
        assert!((vp.scale() - 3.0).abs() < EPS);
        assert!(close(before, vp.screen_to_world(p)));
    }

    #[test]
    fn zoom_at_bound_is_noop() {
        let mut vp = viewport();
        vp.zoom_at(Point::default(), 0.01);
        assert!((vp.scale() - 0.25).abs() < EPS);
        let offset = vp.offset();
        assert!(!vp.zoom_at(Point::new(50.0, 50.0), 0.5));
        assert_eq!(vp.offset(), offset);
    }

    #[test]
    fn invalid_factor_ignored() {
        let mut vp = viewport();
        assert!(!vp.zoom_at(Point::default(), 0.0));
        assert!(!vp.zoom_at(Point::default(), f32::NAN));
        assert!((vp.scale() - 1.0).abs() < EPS);
    }

    #[test]
    fn wheel_and_button_steps() {
        let mut vp = viewport();
        vp.wheel(Point::default(), 2.0);
        assert!((vp.scale() - 1.21).abs() < EPS);
        vp.zoom_step(Point::default(), -1);
        assert!((vp.scale() - 1.1).abs() < EPS);
    }

    #[test]
    fn drag_cycle() {
        let mut vp = viewport();
        assert!(!vp.pointer_move(Point::new(5.0, 5.0)));
        vp.pointer_down(Point::new(10.0, 10.0));
        assert!(vp.is_dragging());
        assert!(vp.pointer_move(Point::new(25.0, 5.0)));
        assert!(vp.pointer_move(Point::new(30.0, 0.0)));
        assert!(close(vp.offset(), Point::new(20.0, -10.0)));
        assert!(vp.pointer_up());
        assert!(!vp.pointer_up());
        assert!(!vp.pointer_move(Point::new(100.0, 100.0)));
        assert!(close(vp.offset(), Point::new(20.0, -10.0)));
    }

    #[test]
    fn restore_clamps_scale() {
        let config = ViewportConfig::default();
        let vp = Viewport::with_state(
            &config,
            ViewportState {
                offset_x: 1.0,
                offset_y: 2.0,
                scale: 50.0,
            },
        );
        assert!((vp.scale() - config.max_scale).abs() < EPS);
        assert!((vp.state().offset_y - 2.0).abs() < EPS);
    }

    #[test]
    fn restore_rejects_nan() {
        let config = ViewportConfig::default();
        let vp = Viewport::with_state(
            &config,
            ViewportState {
                offset_x: f32::NAN,
                offset_y: 0.0,
                scale: 1.0,
            },
        );
        assert_eq!(vp.state(), config.initial);
    }

    #[test]
    fn hit_test_picks_nearest_inside_radius() {
        let targets = [
            HitTarget {
                id: "a",
                center: Point::new(0.0, 0.0),
                radius: 10.0,
            },
            HitTarget {
                id: "b",
                center: Point::new(8.0, 0.0),
                radius: 10.0,
            },
            HitTarget {
                id: "far",
                center: Point::new(100.0, 0.0),
                radius: 5.0,
            },
        ];
        assert_eq!(hit_test(targets, Point::new(6.0, 0.0)), Some("b"));
        assert_eq!(hit_test(targets, Point::new(-3.0, 0.0)), Some("a"));
        assert_eq!(hit_test(targets, Point::new(50.0, 0.0)), None);
    }
}
