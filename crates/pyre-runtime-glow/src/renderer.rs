use glam::Mat4;
use glow::HasContext;
use pyre_core::{EngineError, Settings};
use pyre_sim::blackbody::{emission_scale, WAVELENGTHS_UM};
use pyre_sim::{GridSize, OrbitCamera, VolumeTransform};

use crate::shaders::{FULLSCREEN_VERT, RAY_MARCH_FRAG};
use crate::{FullscreenTriangle, ShaderProgram};

/// Samples along each view ray.
pub const RAY_STEPS: i32 = 128;
/// Extinction per unit density per simulation unit.
pub const SMOKE_ABSORPTION: f32 = 0.35;

/// Emission factor such that one `size_ratio` unit of gas at the source temperature
/// contributes a brightness of 1 in its brightest channel.
pub fn emission_for(settings: &Settings) -> f32 {
    emission_scale(settings.source_temperature) / settings.simulation_scale.max(f32::EPSILON)
}

/// Draws the density and temperature volumes to the default framebuffer.
#[derive(Debug)]
pub struct RayRenderer {
    program: ShaderProgram,
    triangle: FullscreenTriangle,
    camera: OrbitCamera,
    transform: VolumeTransform,
    width: u32,
    height: u32,
    background: [f32; 3],
    filter: [f32; 3],
    color_space: [f32; 3],
    emission: f32,
    simulation_size: [f32; 3],
}

impl RayRenderer {
    pub unsafe fn new(gl: &glow::Context, settings: &Settings) -> Result<Self, EngineError> {
        let program = ShaderProgram::new(gl, "ray_march", FULLSCREEN_VERT, RAY_MARCH_FRAG)?;
        let triangle = FullscreenTriangle::new(gl)?;
        let mut renderer = Self {
            program,
            triangle,
            camera: OrbitCamera::default(),
            transform: VolumeTransform::from_settings(settings),
            width: 1,
            height: 1,
            background: settings.background_color,
            filter: settings.filter_color,
            color_space: settings.color_space,
            emission: emission_for(settings),
            simulation_size: settings.simulation_size(),
        };
        renderer.change_settings(settings);
        Ok(renderer)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Orbit the camera by a drag of (`dx`, `dy`) pixels.
    pub fn touch(&mut self, dx: f32, dy: f32) {
        self.camera.rotate(dx, dy);
    }

    /// Zoom by `factor`. The focus point does not move the orbit centre.
    pub fn scale(&mut self, factor: f32, _focus_x: f64, _focus_y: f64) {
        self.camera.zoom(factor);
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Unit grid cube to clip space.
    pub fn mvp(&self) -> Mat4 {
        let aspect = self.width as f32 / self.height as f32;
        self.camera.mvp(self.transform.model(), aspect)
    }

    pub fn inverse_mvp(&self) -> Mat4 {
        self.mvp().inverse()
    }

    pub fn change_settings(&mut self, settings: &Settings) {
        self.transform = VolumeTransform::from_settings(settings);
        self.background = settings.background_color;
        self.filter = settings.filter_color;
        self.color_space = settings.color_space.map(|c| c.max(0.01));
        self.emission = emission_for(settings);
        self.simulation_size = settings.simulation_size();
    }

    pub unsafe fn draw(
        &mut self,
        gl: &glow::Context,
        density: glow::NativeTexture,
        temperature: glow::NativeTexture,
        size: GridSize,
    ) {
        let inv_mvp = self.inverse_mvp();

        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        gl.viewport(0, 0, self.width as i32, self.height as i32);
        gl.disable(glow::DEPTH_TEST);
        gl.disable(glow::BLEND);
        gl.clear_color(self.background[0], self.background[1], self.background[2], 1.0);
        gl.clear(glow::COLOR_BUFFER_BIT);

        let p = &mut self.program;
        p.bind(gl);
        p.set_texture_3d(gl, "uDensity", 0, density);
        p.set_texture_3d(gl, "uTemperature", 1, temperature);
        p.set_mat4(gl, "uInvMvp", &inv_mvp);
        p.set_vec3(gl, "uSimulationSize", self.simulation_size);
        p.set_vec3(gl, "uBackground", self.background);
        p.set_vec3(gl, "uFilter", self.filter);
        p.set_vec3(gl, "uColorSpace", self.color_space);
        p.set_vec3(gl, "uLambda", WAVELENGTHS_UM);
        p.set_f32(gl, "uEmissionScale", self.emission);
        p.set_f32(gl, "uAbsorption", SMOKE_ABSORPTION);
        p.set_i32(gl, "uSteps", steps_for(size));
        self.triangle.draw(gl);

        gl.bind_texture(glow::TEXTURE_3D, None);
        gl.use_program(None);
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.program.destroy(gl);
        self.triangle.destroy(gl);
    }
}

/// At least one sample per cell along the longest axis, up to twice [`RAY_STEPS`].
fn steps_for(size: GridSize) -> i32 {
    let longest = size.width.max(size.height).max(size.depth) as i32;
    longest.clamp(RAY_STEPS, 2 * RAY_STEPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn emission_normalises_the_source_temperature() {
        let s = Settings::default();
        let e = emission_for(&s);
        let peak = pyre_sim::blackbody::radiance(s.source_temperature)
            .into_iter()
            .fold(0.0f32, f32::max);
        assert!((peak * e * s.simulation_scale - 1.0).abs() < 1e-4);
    }

    #[test]
    fn ray_steps_follow_the_grid() {
        assert_eq!(steps_for(GridSize::new(12, 48, 12)), RAY_STEPS);
        assert_eq!(steps_for(GridSize::new(60, 240, 60)), 240);
        assert_eq!(steps_for(GridSize::new(60, 600, 60)), 2 * RAY_STEPS);
    }

    #[test]
    fn default_view_sees_the_volume_centre() {
        let s = Settings::default();
        let cam = OrbitCamera::default();
        let mvp = cam.mvp(VolumeTransform::from_settings(&s).model(), 1.0);
        let clip = mvp * Vec4::new(0.5, 0.5, 0.5, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }
}
