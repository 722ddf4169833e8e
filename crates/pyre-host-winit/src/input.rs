//! Translation of winit input into surface pointer and scale events.

use pyre_host::{PointerAction, PointerEvent, ScaleEvent};
use winit::event::{ElementState, MouseScrollDelta, TouchPhase};

/// Pointer id used for the left mouse button; touch contacts get `id + 1`.
pub const MOUSE_POINTER_ID: u64 = 0;

/// Pixels of smooth scrolling that double (or halve) the zoom.
const PIXELS_PER_ZOOM: f64 = 500.0;

pub fn touch_action(phase: TouchPhase) -> PointerAction {
    match phase {
        TouchPhase::Started => PointerAction::Down,
        TouchPhase::Moved => PointerAction::Move,
        TouchPhase::Ended => PointerAction::Up,
        TouchPhase::Cancelled => PointerAction::Cancel,
    }
}

pub fn touch_pointer_id(id: u64) -> u64 {
    id.saturating_add(1)
}

/// Zoom factor for one wheel step: `1.1^lines` or `1 + dy/500` for pixel deltas.
pub fn wheel_factor(delta: MouseScrollDelta) -> f32 {
    let factor = match delta {
        MouseScrollDelta::LineDelta(_, lines) => 1.1f32.powf(lines),
        MouseScrollDelta::PixelDelta(pos) => (1.0 + pos.y / PIXELS_PER_ZOOM) as f32,
    };
    factor.max(0.1)
}

/// Tracks the cursor and left button so cursor motion becomes drag events.
#[derive(Debug, Default, Clone, Copy)]
pub struct MouseTracker {
    x: f64,
    y: f64,
    pressed: bool,
}

impl MouseTracker {
    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    /// Record a cursor move; yields a `Move` while the button is held.
    pub fn moved(&mut self, x: f64, y: f64) -> Option<PointerEvent> {
        self.x = x;
        self.y = y;
        self.pressed.then(|| self.event(PointerAction::Move))
    }

    pub fn button(&mut self, state: ElementState) -> Option<PointerEvent> {
        match (state, self.pressed) {
            (ElementState::Pressed, false) => {
                self.pressed = true;
                Some(self.event(PointerAction::Down))
            }
            (ElementState::Released, true) => {
                self.pressed = false;
                Some(self.event(PointerAction::Up))
            }
            _ => None,
        }
    }

    /// The cursor left the window mid-drag.
    pub fn cancel(&mut self) -> Option<PointerEvent> {
        if !self.pressed {
            return None;
        }
        self.pressed = false;
        Some(self.event(PointerAction::Cancel))
    }

    pub fn scale(&self, delta: MouseScrollDelta) -> ScaleEvent {
        ScaleEvent {
            factor: wheel_factor(delta),
            focus_x: self.x,
            focus_y: self.y,
        }
    }

    fn event(&self, action: PointerAction) -> PointerEvent {
        PointerEvent {
            id: MOUSE_POINTER_ID,
            action,
            x: self.x,
            y: self.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn wheel_lines_and_pixels() {
        assert!((wheel_factor(MouseScrollDelta::LineDelta(0.0, 1.0)) - 1.1).abs() < 1e-6);
        assert!((wheel_factor(MouseScrollDelta::LineDelta(0.0, -2.0)) - 1.0 / 1.21).abs() < 1e-5);
        let px = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 50.0));
        assert!((wheel_factor(px) - 1.1).abs() < 1e-6);
        let huge = MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -5000.0));
        assert_eq!(wheel_factor(huge), 0.1);
    }

    #[test]
    fn drag_sequence() {
        let mut m = MouseTracker::default();
        assert!(m.moved(10.0, 20.0).is_none());

        let down = m.button(ElementState::Pressed).unwrap();
        assert_eq!(down.action, PointerAction::Down);
        assert_eq!((down.x, down.y), (10.0, 20.0));
        assert!(m.button(ElementState::Pressed).is_none());

        let mv = m.moved(15.0, 25.0).unwrap();
        assert_eq!(mv.action, PointerAction::Move);
        assert_eq!(mv.id, MOUSE_POINTER_ID);

        let up = m.button(ElementState::Released).unwrap();
        assert_eq!(up.action, PointerAction::Up);
        assert!(m.moved(30.0, 30.0).is_none());
        assert!(m.cancel().is_none());
    }

    #[test]
    fn touch_phases_and_ids() {
        assert_eq!(touch_action(TouchPhase::Started), PointerAction::Down);
        assert_eq!(touch_action(TouchPhase::Cancelled), PointerAction::Cancel);
        assert_eq!(touch_pointer_id(0), 1);
        assert_eq!(touch_pointer_id(u64::MAX), u64::MAX);
    }
}
