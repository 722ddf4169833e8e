//! winit + glutin surface for the pyre host contract.
//
// `WinitSurface` records what a `SurfaceHost` installs (pixel format, API version,
// renderer, input handler) and, on `run`, turns it into a window, a GLES context and an
// event loop that drives the delegates.

pub mod input;

use std::cmp::Reverse;
use std::ffi::CString;
use std::fmt;
use std::num::NonZeroU32;

use glutin::config::{Api, ColorBufferType, Config, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::{SurfaceAttributesBuilder, WindowSurface};
use pyre_core::EngineError;
use pyre_host::{
    lock_delegate, ClientApiVersion, PixelFormat, PointerEvent, SharedInput, SharedRenderer,
    SurfacePlatform,
};
use raw_window_handle::HasRawWindowHandle;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::input::{touch_action, touch_pointer_id, MouseTracker};

/// Desktop window standing in for a platform drawing surface.
pub struct WinitSurface {
    title: String,
    width: u32,
    height: u32,
    pixel_format: Option<PixelFormat>,
    api_version: Option<ClientApiVersion>,
    renderer: Option<SharedRenderer<glow::Context>>,
    input: Option<SharedInput>,
}

impl WinitSurface {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width: width.max(1),
            height: height.max(1),
            pixel_format: None,
            api_version: None,
            renderer: None,
            input: None,
        }
    }

    pub fn pixel_format(&self) -> Option<PixelFormat> {
        self.pixel_format
    }

    pub fn api_version(&self) -> Option<ClientApiVersion> {
        self.api_version
    }

    pub fn renderer(&self) -> Option<&SharedRenderer<glow::Context>> {
        self.renderer.as_ref()
    }

    pub fn input_handler(&self) -> Option<&SharedInput> {
        self.input.as_ref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Open the window and run the event loop until it is closed.
    ///
    /// Fails before opening anything if the surface was never configured.
    pub fn run(self) -> Result<(), EngineError> {
        let format = self
            .pixel_format
            .ok_or_else(|| EngineError::surface("pixel format was not set"))?;
        let version = self
            .api_version
            .ok_or_else(|| EngineError::surface("client API version was not set"))?;
        let renderer = self
            .renderer
            .ok_or_else(|| EngineError::surface("no renderer installed"))?;
        let input = self
            .input
            .ok_or_else(|| EngineError::surface("no input handler installed"))?;

        let event_loop = EventLoop::new();

        let window_builder = WindowBuilder::new()
            .with_title(self.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(self.width, self.height));

        let template = config_template(format);
        let display_builder =
            glutin_winit::DisplayBuilder::new().with_window_builder(Some(window_builder));

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                configs
                    .max_by_key(|c| config_score(format, c))
                    // find_configs fails before the picker runs when nothing matches.
                    .expect("display offered no GL configs")
            })
            .map_err(|e| EngineError::GlCreate(format!("DisplayBuilder.build: {e}")))?;

        let window = window
            .ok_or_else(|| EngineError::GlCreate("DisplayBuilder did not create a window".into()))?;
        let gl_display = gl_config.display();
        tracing::info!(
            depth = gl_config.depth_size(),
            alpha = gl_config.alpha_size(),
            stencil = gl_config.stencil_size(),
            "selected GL config"
        );

        let raw_window_handle = window.raw_window_handle();

        let gles = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(version.major(), 0))))
            .build(Some(raw_window_handle));

        // Desktop GL 4.3 accepts `#version 300 es` shaders.
        let fallback = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(4, 3))))
            .build(Some(raw_window_handle));

        let not_current_gl_context = unsafe {
            gl_display
                .create_context(&gl_config, &gles)
                .or_else(|e| {
                    tracing::warn!(error = %e, "GLES context unavailable, trying desktop GL");
                    gl_display.create_context(&gl_config, &fallback)
                })
                .map_err(|e| EngineError::GlCreate(format!("create_context: {e}")))?
        };

        let (width, height) = {
            let s = window.inner_size();
            (s.width.max(1), s.height.max(1))
        };

        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            non_zero(width),
            non_zero(height),
        );

        let gl_surface = unsafe {
            gl_display
                .create_window_surface(&gl_config, &attrs)
                .map_err(|e| EngineError::GlCreate(format!("create_window_surface: {e}")))?
        };

        let gl_context = not_current_gl_context
            .make_current(&gl_surface)
            .map_err(|e| EngineError::GlCreate(format!("make_current: {e}")))?;

        let gl = unsafe {
            glow::Context::from_loader_function(|s| match CString::new(s) {
                Ok(name) => gl_display.get_proc_address(name.as_c_str()) as *const _,
                Err(_) => std::ptr::null(),
            })
        };

        {
            let mut r = lock_delegate(&renderer);
            r.on_surface_created(&gl)?;
            r.on_surface_changed(&gl, width, height)?;
        }

        let mut mouse = MouseTracker::default();
        let pointer_input = input.clone();
        let dispatch = move |event: PointerEvent| {
            deliver_pointer(&pointer_input, event);
        };

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Poll;

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,

                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                virtual_keycode: Some(VirtualKeyCode::Escape),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } => *control_flow = ControlFlow::Exit,

                    WindowEvent::Resized(physical_size) => {
                        let w = physical_size.width.max(1);
                        let h = physical_size.height.max(1);
                        gl_surface.resize(&gl_context, non_zero(w), non_zero(h));

                        if let Err(e) = lock_delegate(&renderer).on_surface_changed(&gl, w, h) {
                            tracing::error!(error = %e, "surface change failed");
                            *control_flow = ControlFlow::ExitWithCode(1);
                            return;
                        }
                        window.request_redraw();
                    }

                    WindowEvent::CursorMoved { position, .. } => {
                        if let Some(ev) = mouse.moved(position.x, position.y) {
                            dispatch(ev);
                        }
                    }

                    WindowEvent::CursorLeft { .. } => {
                        if let Some(ev) = mouse.cancel() {
                            dispatch(ev);
                        }
                    }

                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        if let Some(ev) = mouse.button(state) {
                            dispatch(ev);
                        }
                    }

                    WindowEvent::MouseWheel { delta, .. } => {
                        let ev = mouse.scale(delta);
                        lock_delegate(&input).on_scale(&ev);
                    }

                    WindowEvent::Touch(touch) => dispatch(PointerEvent {
                        id: touch_pointer_id(touch.id),
                        action: touch_action(touch.phase),
                        x: touch.location.x,
                        y: touch.location.y,
                    }),

                    _ => {}
                },

                Event::MainEventsCleared => window.request_redraw(),

                Event::RedrawRequested(_) => {
                    if let Err(e) = lock_delegate(&renderer).on_draw_frame(&gl) {
                        tracing::error!(error = %e, "draw failed");
                        *control_flow = ControlFlow::ExitWithCode(1);
                        return;
                    }
                    if let Err(e) = gl_surface.swap_buffers(&gl_context) {
                        tracing::error!(error = %e, "swap_buffers failed");
                        *control_flow = ControlFlow::ExitWithCode(1);
                    }
                }

                _ => {}
            }
        })
    }
}

impl SurfacePlatform for WinitSurface {
    type Graphics = glow::Context;

    fn set_pixel_format(&mut self, format: PixelFormat) {
        self.pixel_format = Some(format);
    }

    fn set_client_api_version(&mut self, version: ClientApiVersion) {
        self.api_version = Some(version);
    }

    fn set_renderer(&mut self, renderer: SharedRenderer<glow::Context>) {
        self.renderer = Some(renderer);
    }

    fn set_input_handler(&mut self, handler: SharedInput) {
        self.input = Some(handler);
    }
}

impl fmt::Debug for WinitSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WinitSurface")
            .field("title", &self.title)
            .field("size", &(self.width, self.height))
            .field("pixel_format", &self.pixel_format)
            .field("api_version", &self.api_version)
            .field("renderer", &self.renderer.is_some())
            .field("input", &self.input.is_some())
            .finish()
    }
}

/// Hand `event` to the input delegate; returns whether it consumed the event.
fn deliver_pointer(input: &SharedInput, event: PointerEvent) -> bool {
    let handled = lock_delegate(input).on_pointer(&event);
    if !handled {
        tracing::trace!(id = event.id, action = ?event.action, "pointer event not handled");
    }
    handled
}

fn non_zero(v: u32) -> NonZeroU32 {
    NonZeroU32::new(v).unwrap_or(NonZeroU32::MIN)
}

fn config_template(format: PixelFormat) -> ConfigTemplateBuilder {
    ConfigTemplateBuilder::new()
        .with_buffer_type(ColorBufferType::Rgb {
            r_size: format.red_bits,
            g_size: format.green_bits,
            b_size: format.blue_bits,
        })
        .with_alpha_size(format.alpha_bits)
        .with_depth_size(format.depth_bits)
        .with_stencil_size(format.stencil_bits)
        .with_api(Api::GLES3)
        .with_transparency(false)
}

fn config_score(format: PixelFormat, config: &Config) -> (bool, bool, Reverse<u8>) {
    rank_config(
        format,
        config.depth_size(),
        config.alpha_size(),
        config.stencil_size(),
        config.num_samples(),
    )
}

/// Exact depth/alpha first, then exact stencil, then fewest samples.
fn rank_config(
    format: PixelFormat,
    depth: u8,
    alpha: u8,
    stencil: u8,
    samples: u8,
) -> (bool, bool, Reverse<u8>) {
    (
        depth == format.depth_bits && alpha == format.alpha_bits,
        stencil == format.stencil_bits,
        Reverse(samples),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyre_host::{InputDelegate, PointerAction, CLIENT_API_VERSION, SURFACE_PIXEL_FORMAT};
    use std::sync::{Arc, Mutex};

    /// Consumes events only for pointers it saw go down.
    #[derive(Default)]
    struct DownOnly {
        down: Vec<u64>,
    }

    impl InputDelegate for DownOnly {
        fn on_pointer(&mut self, ev: &PointerEvent) -> bool {
            match ev.action {
                PointerAction::Down => {
                    self.down.push(ev.id);
                    true
                }
                _ => self.down.contains(&ev.id),
            }
        }
    }

    #[test]
    fn pointer_delivery_reports_consumption() {
        let input: SharedInput = Arc::new(Mutex::new(DownOnly::default()));
        let ev = |id, action| PointerEvent {
            id,
            action,
            x: 0.0,
            y: 0.0,
        };
        assert!(!deliver_pointer(&input, ev(3, PointerAction::Move)));
        assert!(deliver_pointer(&input, ev(3, PointerAction::Down)));
        assert!(deliver_pointer(&input, ev(3, PointerAction::Up)));
    }

    #[test]
    fn exact_format_beats_deeper_buffers() {
        let f = SURFACE_PIXEL_FORMAT;
        let exact = rank_config(f, 16, 0, 0, 0);
        let deeper = rank_config(f, 24, 8, 8, 0);
        let stencil = rank_config(f, 16, 0, 8, 0);
        let msaa = rank_config(f, 16, 0, 0, 4);
        assert!(exact > deeper);
        assert!(exact > stencil);
        assert!(stencil > deeper);
        assert!(exact > msaa);
    }

    #[test]
    fn run_refuses_an_unconfigured_surface() {
        let surface = WinitSurface::new("test", 0, 0);
        assert!(matches!(surface.run(), Err(EngineError::Surface(_))));

        let mut surface = WinitSurface::new("test", 640, 480);
        surface.set_pixel_format(SURFACE_PIXEL_FORMAT);
        surface.set_client_api_version(CLIENT_API_VERSION);
        let err = surface.run().unwrap_err();
        assert!(err.to_string().contains("renderer"));
    }

    #[test]
    fn records_what_the_host_installs() {
        let mut surface = WinitSurface::new("test", 640, 480);
        assert!(surface.pixel_format().is_none());
        surface.set_pixel_format(SURFACE_PIXEL_FORMAT);
        surface.set_client_api_version(CLIENT_API_VERSION);
        assert_eq!(surface.pixel_format(), Some(SURFACE_PIXEL_FORMAT));
        assert_eq!(surface.api_version().map(|v| v.major()), Some(3));
        assert!(surface.renderer().is_none());
        assert!(surface.input_handler().is_none());
        assert!(format!("{surface:?}").contains("renderer: false"));
    }
}
