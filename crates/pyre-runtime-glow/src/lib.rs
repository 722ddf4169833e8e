//! pyre runtime (glow/OpenGL ES 3 backend)
//
// This crate contains the GPU side of the fire:
// - compile/link shaders
// - 3D volume textures and the slab operator that renders into them layer by layer
// - simulation operations, the simulator step and the ray-marching renderer
//
// It does NOT contain windowing, input mapping, file IO or OSC.
#![allow(clippy::missing_safety_doc)]

use std::collections::HashMap;

use glow::HasContext;

pub mod fire;
pub mod operations;
pub mod renderer;
pub mod shaders;
pub mod simulator;
pub mod slab;
pub mod volume;

pub use fire::{Fire, PendingSettings};
pub use operations::SimulationOperations;
pub use pyre_core::EngineError;
pub use renderer::RayRenderer;
pub use simulator::Simulator;
pub use slab::{SlabOperator, SlabRegion};
pub use volume::{DataTexturePair, VolumeFormat, VolumeTexture};

/// Shader stage of a compile failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    fn gl_kind(self) -> u32 {
        match self {
            Stage::Vertex => glow::VERTEX_SHADER,
            Stage::Fragment => glow::FRAGMENT_SHADER,
        }
    }

    /// Compiler log tagged with the program it belongs to.
    pub fn error(self, label: &str, log: &str) -> EngineError {
        let msg = format!("{label}: {}", log.trim_end());
        match self {
            Stage::Vertex => EngineError::VertexCompile(msg),
            Stage::Fragment => EngineError::FragmentCompile(msg),
        }
    }
}

unsafe fn compile_stage(
    gl: &glow::Context,
    label: &str,
    stage: Stage,
    src: &str,
) -> Result<glow::NativeShader, EngineError> {
    let shader = gl
        .create_shader(stage.gl_kind())
        .map_err(|e| EngineError::GlCreate(format!("{label}: {stage:?} shader: {e}")))?;
    gl.shader_source(shader, src);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(stage.error(label, &log));
    }
    Ok(shader)
}

/// Compile and link the slab or ray-march program named `label`.
pub unsafe fn compile_program(
    gl: &glow::Context,
    label: &str,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::NativeProgram, EngineError> {
    let vs = compile_stage(gl, label, Stage::Vertex, vert_src)?;
    let fs = match compile_stage(gl, label, Stage::Fragment, frag_src) {
        Ok(fs) => fs,
        Err(e) => {
            gl.delete_shader(vs);
            return Err(e);
        }
    };

    let program = match gl.create_program() {
        Ok(p) => p,
        Err(e) => {
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(EngineError::GlCreate(format!("{label}: program: {e}")));
        }
    };
    for shader in [vs, fs] {
        gl.attach_shader(program, shader);
    }
    gl.link_program(program);
    for shader in [vs, fs] {
        gl.detach_shader(program, shader);
        gl.delete_shader(shader);
    }

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(EngineError::Link(format!("{label}: {}", log.trim_end())));
    }
    Ok(program)
}

/// A linked program plus a lazily filled uniform location cache.
#[derive(Debug)]
pub struct ShaderProgram {
    pub program: glow::NativeProgram,
    label: &'static str,
    locations: HashMap<&'static str, Option<glow::NativeUniformLocation>>,
}

impl ShaderProgram {
    pub unsafe fn new(
        gl: &glow::Context,
        label: &'static str,
        vert_src: &str,
        frag_src: &str,
    ) -> Result<Self, EngineError> {
        let program = compile_program(gl, label, vert_src, frag_src).map_err(|e| {
            tracing::error!(program = label, "shader build failed: {e}");
            e
        })?;
        Ok(Self {
            program,
            label,
            locations: HashMap::new(),
        })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub unsafe fn bind(&self, gl: &glow::Context) {
        gl.use_program(Some(self.program));
    }

    unsafe fn location(
        &mut self,
        gl: &glow::Context,
        name: &'static str,
    ) -> Option<glow::NativeUniformLocation> {
        let program = self.program;
        self.locations
            .entry(name)
            .or_insert_with(|| gl.get_uniform_location(program, name))
            .clone()
    }

    pub unsafe fn set_i32(&mut self, gl: &glow::Context, name: &'static str, v: i32) {
        let loc = self.location(gl, name);
        gl.uniform_1_i32(loc.as_ref(), v);
    }

    pub unsafe fn set_f32(&mut self, gl: &glow::Context, name: &'static str, v: f32) {
        let loc = self.location(gl, name);
        gl.uniform_1_f32(loc.as_ref(), v);
    }

    pub unsafe fn set_vec3(&mut self, gl: &glow::Context, name: &'static str, v: [f32; 3]) {
        let loc = self.location(gl, name);
        gl.uniform_3_f32(loc.as_ref(), v[0], v[1], v[2]);
    }

    pub unsafe fn set_ivec3(&mut self, gl: &glow::Context, name: &'static str, v: [i32; 3]) {
        let loc = self.location(gl, name);
        gl.uniform_3_i32(loc.as_ref(), v[0], v[1], v[2]);
    }

    pub unsafe fn set_mat4(&mut self, gl: &glow::Context, name: &'static str, m: &glam::Mat4) {
        let loc = self.location(gl, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &m.to_cols_array());
    }

    /// Bind `tex` as a 3D texture on `unit` and point sampler `name` at it.
    pub unsafe fn set_texture_3d(
        &mut self,
        gl: &glow::Context,
        name: &'static str,
        unit: u32,
        tex: glow::NativeTexture,
    ) {
        gl.active_texture(glow::TEXTURE0 + unit);
        gl.bind_texture(glow::TEXTURE_3D, Some(tex));
        self.set_i32(gl, name, unit as i32);
    }

    pub unsafe fn set_volume(
        &mut self,
        gl: &glow::Context,
        name: &'static str,
        unit: u32,
        volume: &VolumeTexture,
    ) {
        self.set_texture_3d(gl, name, unit, volume.tex);
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_program(self.program);
        self.locations.clear();
    }
}

/// Position xy then uv per vertex; one triangle whose uv spans [0, 1] over the viewport.
pub const FULLSCREEN_VERTS: [[f32; 4]; 3] = [
    [-1.0, -1.0, 0.0, 0.0],
    [3.0, -1.0, 2.0, 0.0],
    [-1.0, 3.0, 0.0, 2.0],
];

const VERTEX_STRIDE: i32 = std::mem::size_of::<[f32; 4]>() as i32;

/// Vertex array feeding `a_pos` (location 0) and `a_uv` (location 1) to every slab and
/// the ray march.
#[derive(Debug)]
pub struct FullscreenTriangle {
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
}

impl FullscreenTriangle {
    pub unsafe fn new(gl: &glow::Context) -> Result<Self, EngineError> {
        let vao = gl
            .create_vertex_array()
            .map_err(|e| EngineError::GlCreate(format!("fullscreen vertex array: {e}")))?;
        let vbo = match gl.create_buffer() {
            Ok(b) => b,
            Err(e) => {
                gl.delete_vertex_array(vao);
                return Err(EngineError::GlCreate(format!("fullscreen buffer: {e}")));
            }
        };

        gl.bind_vertex_array(Some(vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&FULLSCREEN_VERTS[..]),
            glow::STATIC_DRAW,
        );
        for (location, offset) in [(0, 0), (1, 2)] {
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_f32(
                location,
                2,
                glow::FLOAT,
                false,
                VERTEX_STRIDE,
                offset * 4,
            );
        }
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_vertex_array(None);

        Ok(Self { vao, vbo })
    }

    pub unsafe fn draw(&self, gl: &glow::Context) {
        gl.bind_vertex_array(Some(self.vao));
        gl.draw_arrays(glow::TRIANGLES, 0, 3);
        gl.bind_vertex_array(None);
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        gl.delete_vertex_array(self.vao);
        gl.delete_buffer(self.vbo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_errors_name_the_program() {
        let e = Stage::Fragment.error("advect", "0:12: 'uDt' undeclared\n");
        assert_eq!(
            e.to_string(),
            "fragment shader compile error: advect: 0:12: 'uDt' undeclared"
        );
        assert!(matches!(
            Stage::Vertex.error("ray", "x"),
            EngineError::VertexCompile(_)
        ));
    }

    #[test]
    fn fullscreen_uv_matches_clip_space() {
        for [x, y, u, v] in FULLSCREEN_VERTS {
            assert_eq!(u, (x + 1.0) * 0.5);
            assert_eq!(v, (y + 1.0) * 0.5);
        }
        assert_eq!(VERTEX_STRIDE, 16);
    }
}
