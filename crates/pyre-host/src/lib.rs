#![forbid(unsafe_code)]

//! Surface host contract.
//!
//! A [`SurfaceHost`] owns a platform drawing surface, applies the fixed pixel format and
//! client API version the fire renderer needs, and installs a renderer delegate and an
//! input delegate built from one platform context.
//!
//! This crate is **contract-only**: no windowing, no GL. Platforms (see `pyre-host-winit`)
//! implement [`SurfacePlatform`] and invoke the installed delegates.
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]

pub mod delegate;
pub mod surface;

use std::fmt;
use std::sync::{Arc, Mutex};

pub use delegate::{
    lock_delegate, FromContext, InputDelegate, PointerAction, PointerEvent, RenderDelegate,
    ScaleEvent,
};
pub use pyre_core::EngineError;
pub use surface::{
    ClientApiVersion, PixelFormat, SharedInput, SharedRenderer, SurfacePlatform,
    CLIENT_API_VERSION, SURFACE_PIXEL_FORMAT,
};

/// Owns a platform surface plus exactly one renderer and one input delegate.
///
/// Both delegates live as long as the host (or until the next [`SurfaceHost::init`]) and
/// are only reachable through read-only accessors; the surface holds the very same
/// allocations.
pub struct SurfaceHost<P, R, I> {
    platform: P,
    renderer: Arc<Mutex<R>>,
    listener: Arc<Mutex<I>>,
}

impl<P, R, I> SurfaceHost<P, R, I>
where
    P: SurfacePlatform,
    P::Graphics: 'static,
    R: RenderDelegate<P::Graphics> + Send + 'static,
    I: InputDelegate + Send + 'static,
{
    /// Construct the host and run initialization once.
    pub fn new<C>(mut platform: P, context: &C) -> Result<Self, EngineError>
    where
        C: ?Sized,
        R: FromContext<C>,
        I: FromContext<C>,
    {
        let (renderer, listener) = Self::install(&mut platform, context)?;
        Ok(Self {
            platform,
            renderer,
            listener,
        })
    }

    /// Re-run initialization: reconfigure the surface and replace both delegates with
    /// freshly constructed ones. The previous delegates are released by the host. If
    /// either delegate fails to build, the host and the platform keep the previous pair.
    pub fn init<C>(&mut self, context: &C) -> Result<(), EngineError>
    where
        C: ?Sized,
        R: FromContext<C>,
        I: FromContext<C>,
    {
        let (renderer, listener) = Self::install(&mut self.platform, context)?;
        self.renderer = renderer;
        self.listener = listener;
        Ok(())
    }

    fn install<C>(
        platform: &mut P,
        context: &C,
    ) -> Result<(Arc<Mutex<R>>, Arc<Mutex<I>>), EngineError>
    where
        C: ?Sized,
        R: FromContext<C>,
        I: FromContext<C>,
    {
        // Both delegates must exist before the platform sees either one.
        let renderer = Arc::new(Mutex::new(R::from_context(context)?));
        let listener = Arc::new(Mutex::new(I::from_context(context)?));

        platform.set_pixel_format(SURFACE_PIXEL_FORMAT);
        platform.set_client_api_version(CLIENT_API_VERSION);

        let shared_renderer: SharedRenderer<P::Graphics> = renderer.clone();
        platform.set_renderer(shared_renderer);
        let shared_input: SharedInput = listener.clone();
        platform.set_input_handler(shared_input);

        tracing::debug!(
            format = ?SURFACE_PIXEL_FORMAT.bits(),
            api = CLIENT_API_VERSION.major(),
            "surface host initialized"
        );
        Ok((renderer, listener))
    }
}

impl<P, R, I> SurfaceHost<P, R, I> {
    pub fn renderer(&self) -> &Arc<Mutex<R>> {
        &self.renderer
    }

    pub fn listener(&self) -> &Arc<Mutex<I>> {
        &self.listener
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Mutable access for platform-specific settings (title, size). Delegates cannot be
    /// swapped through this handle without going through the platform trait.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Give up the host, returning the configured platform (e.g. to run its event loop).
    pub fn into_platform(self) -> P {
        self.platform
    }
}

impl<P: fmt::Debug, R, I> fmt::Debug for SurfaceHost<P, R, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHost")
            .field("platform", &self.platform)
            .field("renderer", &"<renderer delegate>")
            .field("listener", &"<input delegate>")
            .finish()
    }
}

/// Pointer identity between two `Arc`s, ignoring trait-object metadata.
pub fn same_delegate<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
