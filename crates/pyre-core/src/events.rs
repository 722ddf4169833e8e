//! Commands flowing from input handling to the render thread.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::settings::SettingsChange;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireCommand {
    /// Pointer drag at screen position (`x`, `y`) by (`dx`, `dy`) pixels.
    Touch { x: f64, y: f64, dx: f64, dy: f64 },
    /// Pinch/zoom by `factor` around the focus point (`x`, `y`).
    Scale { factor: f32, x: f64, y: f64 },
    /// A tap without movement.
    Click,
    /// Row-major 3x3 device rotation matrix.
    RotationSensor([f32; 9]),
    Change(SettingsChange),
}

/// Shared FIFO of [`FireCommand`]s.
///
/// Cloning yields another handle to the same queue: producers (input, OSC) push, the
/// renderer drains once per frame.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<FireCommand>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<FireCommand>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, cmd: FireCommand) {
        self.lock().push_back(cmd);
    }

    /// Take every queued command in arrival order.
    pub fn drain(&self) -> Vec<FireCommand> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
