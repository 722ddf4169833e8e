use std::ops::Range;

use glow::HasContext;
use pyre_core::EngineError;
use pyre_sim::GridSize;

use crate::shaders::{BOUNDARY_FRAG, FULLSCREEN_VERT};
use crate::volume::{DataTexturePair, VolumeTexture};
use crate::{FullscreenTriangle, ShaderProgram};

/// Which cells of a grid a slab pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlabRegion {
    /// Everything except the one-cell outer shell.
    Interior,
    All,
}

/// Viewport rectangle and layer range a pass covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub layers: Range<i32>,
}

impl SlabRegion {
    pub fn bounds(self, size: GridSize) -> SlabBounds {
        let (w, h, d) = (size.width as i32, size.height as i32, size.depth as i32);
        match self {
            SlabRegion::All => SlabBounds {
                x: 0,
                y: 0,
                width: w,
                height: h,
                layers: 0..d,
            },
            SlabRegion::Interior => SlabBounds {
                x: 1,
                y: 1,
                width: (w - 2).max(0),
                height: (h - 2).max(0),
                layers: 1..(d - 1).max(1),
            },
        }
    }
}

/// Renders a fragment program into every depth layer of a 3D texture.
#[derive(Debug)]
pub struct SlabOperator {
    fbo: glow::NativeFramebuffer,
    triangle: FullscreenTriangle,
    boundary: ShaderProgram,
}

impl SlabOperator {
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, EngineError> {
        let fbo = gl
            .create_framebuffer()
            .map_err(|e| EngineError::GlCreate(format!("create_framebuffer failed: {e:?}")))?;
        let triangle = FullscreenTriangle::new(gl)?;
        let boundary = ShaderProgram::new(gl, "boundary", FULLSCREEN_VERT, BOUNDARY_FRAG)?;
        Ok(Self {
            fbo,
            triangle,
            boundary,
        })
    }

    /// Run `program` over `region` of `target`.
    ///
    /// The caller binds `program` and sets its inputs beforehand; this sets `uGridSize` and
    /// `uLayer`.
    pub unsafe fn run(
        &self,
        gl: &glow::Context,
        program: &mut ShaderProgram,
        target: &VolumeTexture,
        region: SlabRegion,
    ) -> Result<(), EngineError> {
        draw_layers(gl, self.fbo, &self.triangle, program, target, region)
    }

    /// Rewrite the outer shell of `pair` from its inward neighbours times `scale`.
    pub unsafe fn set_boundary(
        &mut self,
        gl: &glow::Context,
        pair: &mut DataTexturePair,
        scale: f32,
    ) -> Result<(), EngineError> {
        let program = &mut self.boundary;
        program.bind(gl);
        program.set_volume(gl, "uData", 0, pair.data());
        program.set_f32(gl, "uScale", scale);
        draw_layers(
            gl,
            self.fbo,
            &self.triangle,
            program,
            pair.result(),
            SlabRegion::All,
        )?;
        pair.swap();
        Ok(())
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_framebuffer(self.fbo);
        self.triangle.destroy(gl);
        self.boundary.destroy(gl);
    }
}

unsafe fn draw_layers(
    gl: &glow::Context,
    fbo: glow::NativeFramebuffer,
    triangle: &FullscreenTriangle,
    program: &mut ShaderProgram,
    target: &VolumeTexture,
    region: SlabRegion,
) -> Result<(), EngineError> {
    let size = target.size;
    let bounds = region.bounds(size);
    if bounds.width == 0 || bounds.height == 0 || bounds.layers.is_empty() {
        return Ok(());
    }

    program.set_ivec3(
        gl,
        "uGridSize",
        [size.width as i32, size.height as i32, size.depth as i32],
    );

    gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
    gl.viewport(bounds.x, bounds.y, bounds.width, bounds.height);

    let first = bounds.layers.start;
    for layer in bounds.layers {
        gl.framebuffer_texture_layer(
            glow::FRAMEBUFFER,
            glow::COLOR_ATTACHMENT0,
            Some(target.tex),
            0,
            layer,
        );
        if layer == first {
            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                return Err(EngineError::GlCreate(format!(
                    "{} pass: framebuffer incomplete: 0x{status:x}",
                    program.label()
                )));
            }
        }
        program.set_i32(gl, "uLayer", layer);
        triangle.draw(gl);
    }

    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
    Ok(())
}
