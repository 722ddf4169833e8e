use std::sync::{Arc, Mutex};

use crate::delegate::{InputDelegate, RenderDelegate};

/// Channel and buffer bit depths requested for a drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
}

impl PixelFormat {
    /// `(red, green, blue, alpha, depth, stencil)`.
    pub fn bits(&self) -> (u8, u8, u8, u8, u8, u8) {
        (
            self.red_bits,
            self.green_bits,
            self.blue_bits,
            self.alpha_bits,
            self.depth_bits,
            self.stencil_bits,
        )
    }
}

/// Requested major version of the client graphics API (OpenGL ES).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientApiVersion(pub u8);

impl ClientApiVersion {
    pub fn major(self) -> u8 {
        self.0
    }
}

/// RGB888, no alpha, 16-bit depth, no stencil.
pub const SURFACE_PIXEL_FORMAT: PixelFormat = PixelFormat {
    red_bits: 8,
    green_bits: 8,
    blue_bits: 8,
    alpha_bits: 0,
    depth_bits: 16,
    stencil_bits: 0,
};

/// OpenGL ES 3.
pub const CLIENT_API_VERSION: ClientApiVersion = ClientApiVersion(3);

/// Renderer delegate as seen by a platform.
pub type SharedRenderer<G> = Arc<Mutex<dyn RenderDelegate<G> + Send>>;

/// Input delegate as seen by a platform.
pub type SharedInput = Arc<Mutex<dyn InputDelegate + Send>>;

/// The platform drawing surface a [`SurfaceHost`](crate::SurfaceHost) configures.
///
/// Implementations own the window/context machinery and later invoke the installed
/// delegates from whatever threads their event model uses.
pub trait SurfacePlatform {
    /// Graphics handle passed to the renderer callbacks (e.g. `glow::Context`).
    type Graphics;

    fn set_pixel_format(&mut self, format: PixelFormat);

    fn set_client_api_version(&mut self, version: ClientApiVersion);

    /// Install the active renderer, replacing any previous one.
    fn set_renderer(&mut self, renderer: SharedRenderer<Self::Graphics>);

    /// Install the active pointer-event handler, replacing any previous one.
    fn set_input_handler(&mut self, handler: SharedInput);
}
