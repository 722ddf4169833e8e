use std::sync::{Mutex, MutexGuard, PoisonError};

use pyre_core::EngineError;

/// Builds a delegate from the platform context handed to the host.
pub trait FromContext<C: ?Sized>: Sized {
    fn from_context(ctx: &C) -> Result<Self, EngineError>;
}

/// Produces frames on the surface.
///
/// Callbacks run on the platform's render thread with its graphics context current.
pub trait RenderDelegate<G> {
    /// The graphics context was (re)created; allocate GPU resources.
    fn on_surface_created(&mut self, gfx: &G) -> Result<(), EngineError>;

    /// The surface size changed (also called once after creation).
    fn on_surface_changed(&mut self, gfx: &G, width: u32, height: u32)
        -> Result<(), EngineError>;

    /// Draw one frame.
    fn on_draw_frame(&mut self, gfx: &G) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerAction {
    Down,
    Move,
    Up,
    Cancel,
}

/// One pointer (mouse button or touch contact) event in surface pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub id: u64,
    pub action: PointerAction,
    pub x: f64,
    pub y: f64,
}

/// A pinch or wheel zoom step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleEvent {
    /// Multiplicative zoom factor; > 1 zooms in.
    pub factor: f32,
    pub focus_x: f64,
    pub focus_y: f64,
}

/// Handles pointer events delivered to the surface.
///
/// Each method returns whether the event was consumed.
pub trait InputDelegate {
    fn on_pointer(&mut self, event: &PointerEvent) -> bool;

    fn on_scale(&mut self, _event: &ScaleEvent) -> bool {
        false
    }

    /// Row-major 3x3 device rotation matrix from an orientation sensor.
    fn on_orientation(&mut self, _rotation: &[f32; 9]) -> bool {
        false
    }
}

/// Lock a delegate, recovering the guard if a previous holder panicked.
pub fn lock_delegate<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
