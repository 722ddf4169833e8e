//! The fire view: surface delegates that drive the simulation, plus CLI and OSC glue.

pub mod cli;
pub mod listener;
pub mod osc;
pub mod renderer;

use pyre_core::{CommandQueue, Settings};
use pyre_host::SurfaceHost;
use pyre_host_winit::WinitSurface;

pub use listener::{FireListener, TAP_SLOP_PX};
pub use renderer::FireRenderer;

/// Everything the delegates are built from.
#[derive(Debug, Clone)]
pub struct FireContext {
    pub settings: Settings,
    pub commands: CommandQueue,
    pub width: u32,
    pub height: u32,
}

impl FireContext {
    pub fn new(settings: Settings, width: u32, height: u32) -> Self {
        Self {
            settings,
            commands: CommandQueue::new(),
            width,
            height,
        }
    }
}

/// The fire surface on a desktop window.
pub type FireView = SurfaceHost<WinitSurface, FireRenderer, FireListener>;
