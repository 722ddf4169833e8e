use glam::Vec3;
use glow::HasContext;
use pyre_core::{EngineError, Resolution, Settings, SourceMode};
use pyre_sim::{noise_volume, GridSize, NoiseBands, SourceFields, Wind, NOISE_TILE};

use crate::operations::SimulationOperations;
use crate::slab::SlabOperator;
use crate::volume::{DataTexturePair, VolumeFormat, VolumeTexture};

/// Converts a unit-cube drag into simulation units per second.
pub const EXTERNAL_FORCE_GAIN: f32 = 4.0;

const FLOAT_TARGETS_EXT: &str = "GL_EXT_color_buffer_float";

/// GLES 3 cannot render into the half-float field textures without this extension.
unsafe fn require_float_targets(gl: &glow::Context) -> Result<(), EngineError> {
    if gl.version().is_embedded && !gl.supported_extensions().contains(FLOAT_TARGETS_EXT) {
        tracing::error!("{FLOAT_TARGETS_EXT} not supported");
        return Err(EngineError::GlCreate(format!(
            "{FLOAT_TARGETS_EXT} is required for simulation render targets"
        )));
    }
    Ok(())
}

/// Direction buoyancy pushes towards.
///
/// With orientation mode on and a sensor reading available this is the world up axis
/// expressed in device coordinates (third row of the row-major rotation matrix).
pub fn buoyancy_up(orientation_mode: bool, rotation: Option<&[f32; 9]>) -> Vec3 {
    match rotation {
        Some(m) if orientation_mode => {
            let up = Vec3::new(m[6], m[7], m[8]);
            if up.length_squared() > 1e-6 {
                up.normalize()
            } else {
                Vec3::Y
            }
        }
        _ => Vec3::Y,
    }
}

/// GPU fields whose sizes follow the settings.
#[derive(Debug)]
struct Fields {
    low: GridSize,
    high: GridSize,
    density: DataTexturePair,
    temperature: DataTexturePair,
    low_velocity: DataTexturePair,
    high_velocity: DataTexturePair,
    density_source: VolumeTexture,
    temperature_source: VolumeTexture,
    velocity_source: VolumeTexture,
    noise: VolumeTexture,
}

impl Fields {
    unsafe fn new(gl: &glow::Context, settings: &Settings) -> Result<Self, EngineError> {
        let high_src = SourceFields::generate(settings, Resolution::Substance);
        let low_src = SourceFields::generate(settings, Resolution::Velocity);
        let (low, high) = (low_src.size, high_src.size);

        let clamp = glow::CLAMP_TO_EDGE;
        let density_source = VolumeTexture::new(gl, high, VolumeFormat::Scalar, clamp)?;
        density_source.upload(gl, &high_src.density)?;
        let temperature_source = VolumeTexture::new(gl, high, VolumeFormat::Scalar, clamp)?;
        temperature_source.upload(gl, &high_src.temperature)?;
        let velocity_source = VolumeTexture::new(gl, low, VolumeFormat::Vector, clamp)?;
        velocity_source.upload_vec3(gl, &low_src.velocity)?;

        let tile = GridSize::cube(NOISE_TILE);
        let noise = VolumeTexture::new(gl, tile, VolumeFormat::Vector, glow::REPEAT)?;
        noise.upload_vec3(gl, &noise_volume(tile, NoiseBands::from_settings(settings)))?;

        tracing::info!(
            low = ?low.to_array(),
            high = ?high.to_array(),
            emitters = high_src.active_cells(),
            "simulation fields generated"
        );

        Ok(Self {
            low,
            high,
            density: DataTexturePair::new(gl, high, VolumeFormat::Scalar)?,
            temperature: DataTexturePair::new(gl, high, VolumeFormat::Scalar)?,
            low_velocity: DataTexturePair::new(gl, low, VolumeFormat::Vector)?,
            high_velocity: DataTexturePair::new(gl, high, VolumeFormat::Vector)?,
            density_source,
            temperature_source,
            velocity_source,
            noise,
        })
    }

    unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.density.destroy(gl);
        self.temperature.destroy(gl);
        self.low_velocity.destroy(gl);
        self.high_velocity.destroy(gl);
        self.density_source.destroy(gl);
        self.temperature_source.destroy(gl);
        self.velocity_source.destroy(gl);
        self.noise.destroy(gl);
    }
}

/// Two-resolution smoke and fire solver.
///
/// Velocity and pressure live on the coarse grid; density, temperature and a
/// turbulence-enriched velocity live on the fine grid.
#[derive(Debug)]
pub struct Simulator {
    slab: SlabOperator,
    ops: SimulationOperations,
    fields: Fields,
    settings: Settings,
    wind: Wind,
    device_rotation: Option<[f32; 9]>,
    external_forces: Vec<(Vec3, Vec3)>,
}

impl Simulator {
    pub unsafe fn init(gl: &glow::Context, settings: &Settings) -> Result<Self, EngineError> {
        settings.validate()?;
        require_float_targets(gl)?;
        let mut fields = Fields::new(gl, settings)?;
        let ops_and_slab = SimulationOperations::new(gl, fields.low, settings.boundary_type)
            .and_then(|mut ops| match SlabOperator::new(gl) {
                Ok(slab) => Ok((ops, slab)),
                Err(e) => {
                    ops.destroy(gl);
                    Err(e)
                }
            });
        let (ops, slab) = match ops_and_slab {
            Ok(built) => built,
            Err(e) => {
                fields.destroy(gl);
                return Err(e);
            }
        };
        Ok(Self {
            slab,
            ops,
            fields,
            settings: settings.clone(),
            wind: Wind::new(settings),
            device_rotation: None,
            external_forces: Vec::new(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Adopt `settings`; with `regen` the fields are rebuilt from scratch.
    pub unsafe fn change_settings(
        &mut self,
        gl: &glow::Context,
        settings: &Settings,
        regen: bool,
    ) -> Result<(), EngineError> {
        settings.validate()?;
        self.settings = settings.clone();
        self.ops.set_boundary_type(settings.boundary_type);

        if regen {
            let mut fields = Fields::new(gl, settings)?;
            if fields.low != self.fields.low {
                match SimulationOperations::new(gl, fields.low, settings.boundary_type) {
                    Ok(ops) => {
                        self.ops.destroy(gl);
                        self.ops = ops;
                    }
                    Err(e) => {
                        fields.destroy(gl);
                        return Err(e);
                    }
                }
            } else {
                self.ops.release_scratch(gl);
            }
            self.fields.destroy(gl);
            self.fields = fields;
            self.external_forces.clear();
        }
        tracing::debug!(name = %settings.name, regen, "simulator settings changed");
        Ok(())
    }

    /// Queue a pointer impulse; `grid_pos` and `grid_vec` are in unit-cube coordinates.
    pub fn add_external_force(&mut self, grid_pos: Vec3, grid_vec: Vec3) {
        self.external_forces.push((grid_pos, grid_vec));
    }

    /// Row-major 3x3 device rotation.
    pub fn update_device_rotation(&mut self, rotation: [f32; 9]) {
        self.device_rotation = Some(rotation);
    }

    /// Advance one step and return `(density, temperature, size)` of the fine grid.
    pub unsafe fn update(
        &mut self,
        gl: &glow::Context,
    ) -> Result<(glow::NativeTexture, glow::NativeTexture, GridSize), EngineError> {
        let dt = self.settings.delta_time;
        self.velocity_step(gl, dt)?;

        let f = &mut self.fields;
        self.ops.turbulence(
            gl,
            &mut self.slab,
            f.low_velocity.data(),
            &f.noise,
            &mut f.high_velocity,
        )?;

        self.temperature_step(gl, dt)?;
        self.smoke_step(gl, dt)?;

        Ok((
            self.fields.density.data().tex,
            self.fields.temperature.data().tex,
            self.fields.high,
        ))
    }

    unsafe fn velocity_step(&mut self, gl: &glow::Context, dt: f32) -> Result<(), EngineError> {
        let s = &self.settings;
        let f = &mut self.fields;
        let slab = &mut self.slab;
        let ops = &mut self.ops;
        let dh = s.res_to_sim_factor(Resolution::Velocity);

        match s.source_mode {
            SourceMode::Add => {
                ops.add_source(gl, slab, &mut f.low_velocity, &f.velocity_source, dt)?
            }
            SourceMode::Set => ops.set_source(gl, slab, &mut f.low_velocity, &f.velocity_source)?,
        }

        let up = buoyancy_up(s.orientation_mode, self.device_rotation.as_ref());
        ops.buoyancy(
            gl,
            slab,
            &mut f.low_velocity,
            f.temperature.data(),
            up,
            s.source_temperature,
            dt,
            s.buoyancy_scale,
        )?;

        self.wind.advance(s, dt);
        ops.wind(gl, slab, &mut f.low_velocity, &self.wind, s, dt)?;

        let cells = f.low.as_vec3();
        let sim_size = Vec3::from_array(s.simulation_size());
        for (pos, vec) in self.external_forces.drain(..) {
            let position = pos.clamp(Vec3::ZERO, Vec3::ONE) * cells;
            let force = vec * sim_size * EXTERNAL_FORCE_GAIN;
            ops.external_force(gl, slab, &mut f.low_velocity, position, force)?;
        }

        ops.vorticity(gl, slab, &mut f.low_velocity, s.vorticity_scale, dt, dh)?;
        ops.diffuse(
            gl,
            slab,
            &mut f.low_velocity,
            s.vel_diffusion_iterations,
            s.vel_kinematic_viscosity,
            dt,
            dh,
        )?;
        ops.projection(gl, slab, &mut f.low_velocity, s.projection_iterations, dh)?;
        ops.self_advection(gl, slab, &mut f.low_velocity, dt, dh)
    }

    unsafe fn temperature_step(&mut self, gl: &glow::Context, dt: f32) -> Result<(), EngineError> {
        let s = &self.settings;
        let f = &mut self.fields;
        let slab = &mut self.slab;
        let ops = &mut self.ops;
        let dh = s.res_to_sim_factor(Resolution::Substance);

        match s.source_mode {
            SourceMode::Add => {
                ops.add_source(gl, slab, &mut f.temperature, &f.temperature_source, dt)?
            }
            SourceMode::Set => ops.set_source(gl, slab, &mut f.temperature, &f.temperature_source)?,
        }
        ops.advection(gl, slab, f.high_velocity.data(), &mut f.temperature, dt, dh)?;
        ops.diffuse(
            gl,
            slab,
            &mut f.temperature,
            s.temp_diffusion_iterations,
            s.temp_kinematic_viscosity,
            dt,
            dh,
        )?;
        ops.heat_dissipation(gl, slab, &mut f.temperature, s.source_temperature, dt)
    }

    unsafe fn smoke_step(&mut self, gl: &glow::Context, dt: f32) -> Result<(), EngineError> {
        let s = &self.settings;
        let f = &mut self.fields;
        let slab = &mut self.slab;
        let ops = &mut self.ops;
        let dh = s.res_to_sim_factor(Resolution::Substance);

        match s.source_mode {
            SourceMode::Add => ops.add_source(gl, slab, &mut f.density, &f.density_source, dt)?,
            SourceMode::Set => ops.set_source(gl, slab, &mut f.density, &f.density_source)?,
        }
        ops.advection(gl, slab, f.high_velocity.data(), &mut f.density, dt, dh)?;
        ops.diffuse(
            gl,
            slab,
            &mut f.density,
            s.smoke_diffusion_iterations,
            s.smoke_kinematic_viscosity,
            dt,
            dh,
        )?;
        ops.dissipate(gl, slab, &mut f.density, s.smoke_dissipation, dt)
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.fields.destroy(gl);
        self.ops.destroy(gl);
        self.slab.destroy(gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_defaults_to_world_y() {
        assert_eq!(buoyancy_up(false, None), Vec3::Y);
        let tilted = [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        assert_eq!(buoyancy_up(false, Some(&tilted)), Vec3::Y);
        assert_eq!(buoyancy_up(true, None), Vec3::Y);
    }

    #[test]
    fn up_follows_the_sensor_in_orientation_mode() {
        // Device lying flat, screen facing the sky: world up is the device +z axis.
        let flat = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert_eq!(buoyancy_up(true, Some(&flat)), Vec3::Z);

        let scaled = [1.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 2.0, 0.0];
        assert_eq!(buoyancy_up(true, Some(&scaled)), Vec3::Y);

        let zero = [0.0; 9];
        assert_eq!(buoyancy_up(true, Some(&zero)), Vec3::Y);
    }
}
