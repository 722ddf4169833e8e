//! Grid operations of the fire solver, each a sequence of slab passes.
//!
//! Every operation that writes a [`DataTexturePair`] renders the interior into
//! `result()`, swaps, and then rewrites the outer shell for the active boundary type.

use glam::Vec3;
use pyre_core::{BoundaryType, EngineError, Settings};
use pyre_sim::{GridSize, Wind};

use crate::shaders::*;
use crate::slab::{SlabOperator, SlabRegion};
use crate::volume::{DataTexturePair, ScratchPool, VolumeFormat, VolumeTexture};
use crate::ShaderProgram;

/// Cooling constant of the fourth-power heat loss.
pub const HEAT_DISSIPATION_RATE: f32 = 1.5;
/// Noise amplitude relative to the local coarse speed.
pub const TURBULENCE_STRENGTH: f32 = 0.6;
/// Width of the pointer impulse in velocity cells.
pub const SPLAT_RADIUS_CELLS: f32 = 2.0;

/// Shell multiplier for a field: solid walls reflect vectors, scalars are always copied.
pub fn boundary_scale(boundary: BoundaryType, format: VolumeFormat) -> f32 {
    match (boundary, format) {
        (BoundaryType::Some, VolumeFormat::Vector) => -1.0,
        _ => 1.0,
    }
}

/// Jacobi weights `(alpha, 1/beta)` for implicit diffusion, or `None` when there is
/// nothing to diffuse.
pub fn diffusion_coefficients(viscosity: f32, dt: f32, dh: f32) -> Option<(f32, f32)> {
    if !(viscosity > 0.0 && dt > 0.0) {
        return None;
    }
    let alpha = dh * dh / (viscosity * dt);
    Some((alpha, 1.0 / (6.0 + alpha)))
}

/// Jacobi weights `(alpha, 1/beta)` for the pressure Poisson equation.
pub fn pressure_coefficients(dh: f32) -> (f32, f32) {
    (-dh * dh, 1.0 / 6.0)
}

#[derive(Debug)]
pub struct SimulationOperations {
    boundary: BoundaryType,

    divergence: VolumeTexture,
    pressure: DataTexturePair,
    curl: VolumeTexture,
    scratch: ScratchPool<VolumeTexture>,

    copy: ShaderProgram,
    advect: ShaderProgram,
    buoyancy: ShaderProgram,
    cooling: ShaderProgram,
    add_source: ShaderProgram,
    set_source: ShaderProgram,
    dissipate: ShaderProgram,
    jacobi: ShaderProgram,
    divergence_prog: ShaderProgram,
    gradient: ShaderProgram,
    curl_prog: ShaderProgram,
    vorticity: ShaderProgram,
    force: ShaderProgram,
    splat: ShaderProgram,
    turbulence: ShaderProgram,
}

impl SimulationOperations {
    /// Compile every program and allocate the projection buffers for the velocity grid.
    pub unsafe fn new(
        gl: &glow::Context,
        velocity_size: GridSize,
        boundary: BoundaryType,
    ) -> Result<Self, EngineError> {
        let program = |label, frag| ShaderProgram::new(gl, label, FULLSCREEN_VERT, frag);
        Ok(Self {
            boundary,
            divergence: VolumeTexture::new(
                gl,
                velocity_size,
                VolumeFormat::Scalar,
                glow::CLAMP_TO_EDGE,
            )?,
            pressure: DataTexturePair::new(gl, velocity_size, VolumeFormat::Scalar)?,
            curl: VolumeTexture::new(
                gl,
                velocity_size,
                VolumeFormat::Vector,
                glow::CLAMP_TO_EDGE,
            )?,
            scratch: ScratchPool::default(),
            copy: program("copy", COPY_FRAG)?,
            advect: program("advect", ADVECT_FRAG)?,
            buoyancy: program("buoyancy", BUOYANCY_FRAG)?,
            cooling: program("cooling", COOLING_FRAG)?,
            add_source: program("add_source", ADD_SOURCE_FRAG)?,
            set_source: program("set_source", SET_SOURCE_FRAG)?,
            dissipate: program("dissipate", DISSIPATE_FRAG)?,
            jacobi: program("jacobi", JACOBI_FRAG)?,
            divergence_prog: program("divergence", DIVERGENCE_FRAG)?,
            gradient: program("gradient", GRADIENT_FRAG)?,
            curl_prog: program("curl", CURL_FRAG)?,
            vorticity: program("vorticity", VORTICITY_FRAG)?,
            force: program("force", FORCE_FRAG)?,
            splat: program("splat", SPLAT_FRAG)?,
            turbulence: program("turbulence", TURBULENCE_FRAG)?,
        })
    }

    pub fn set_boundary_type(&mut self, boundary: BoundaryType) {
        self.boundary = boundary;
    }

    fn scale_for(&self, pair: &DataTexturePair) -> f32 {
        boundary_scale(self.boundary, pair.format())
    }

    unsafe fn finish(
        &self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        pair: &mut DataTexturePair,
    ) -> Result<(), EngineError> {
        pair.swap();
        slab.set_boundary(gl, pair, self.scale_for(pair))
    }

    /// Add buoyant lift from `temperature` along `up`.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn buoyancy(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        velocity: &mut DataTexturePair,
        temperature: &VolumeTexture,
        up: Vec3,
        source_temperature: f32,
        dt: f32,
        scale: f32,
    ) -> Result<(), EngineError> {
        let p = &mut self.buoyancy;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity.data());
        p.set_volume(gl, "uTemperature", 1, temperature);
        p.set_f32(gl, "uDt", dt);
        p.set_f32(gl, "uScale", scale);
        p.set_f32(gl, "uSourceTemperature", source_temperature.max(1.0));
        p.set_vec3(gl, "uUp", up.to_array());
        slab.run(gl, p, velocity.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, velocity)
    }

    /// Move `data` along `velocity`. `dh` is the cell size of `data` in simulation units.
    pub unsafe fn advection(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        velocity: &VolumeTexture,
        data: &mut DataTexturePair,
        dt: f32,
        dh: f32,
    ) -> Result<(), EngineError> {
        let p = &mut self.advect;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity);
        p.set_volume(gl, "uData", 1, data.data());
        p.set_f32(gl, "uDt", dt);
        p.set_f32(gl, "uDh", dh);
        slab.run(gl, p, data.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, data)
    }

    /// Advect a velocity field by itself.
    pub unsafe fn self_advection(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        velocity: &mut DataTexturePair,
        dt: f32,
        dh: f32,
    ) -> Result<(), EngineError> {
        let p = &mut self.advect;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity.data());
        p.set_volume(gl, "uData", 1, velocity.data());
        p.set_f32(gl, "uDt", dt);
        p.set_f32(gl, "uDh", dh);
        slab.run(gl, p, velocity.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, velocity)
    }

    pub unsafe fn heat_dissipation(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        temperature: &mut DataTexturePair,
        source_temperature: f32,
        dt: f32,
    ) -> Result<(), EngineError> {
        let p = &mut self.cooling;
        p.bind(gl);
        p.set_volume(gl, "uData", 0, temperature.data());
        p.set_f32(gl, "uDt", dt);
        p.set_f32(gl, "uRate", HEAT_DISSIPATION_RATE);
        p.set_f32(gl, "uSourceTemperature", source_temperature.max(1.0));
        slab.run(gl, p, temperature.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, temperature)
    }

    /// `data += dt * source`.
    pub unsafe fn add_source(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        data: &mut DataTexturePair,
        source: &VolumeTexture,
        dt: f32,
    ) -> Result<(), EngineError> {
        let p = &mut self.add_source;
        p.bind(gl);
        p.set_volume(gl, "uData", 0, data.data());
        p.set_volume(gl, "uSource", 1, source);
        p.set_f32(gl, "uDt", dt);
        slab.run(gl, p, data.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, data)
    }

    /// Write the source into the field where it is set.
    pub unsafe fn set_source(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        data: &mut DataTexturePair,
        source: &VolumeTexture,
    ) -> Result<(), EngineError> {
        let vector = data.format() == VolumeFormat::Vector;
        let p = &mut self.set_source;
        p.bind(gl);
        p.set_volume(gl, "uData", 0, data.data());
        p.set_volume(gl, "uSource", 1, source);
        p.set_i32(gl, "uVector", vector as i32);
        slab.run(gl, p, data.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, data)
    }

    /// `data /= 1 + dt * rate`.
    pub unsafe fn dissipate(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        data: &mut DataTexturePair,
        rate: f32,
        dt: f32,
    ) -> Result<(), EngineError> {
        if rate <= 0.0 {
            return Ok(());
        }
        let p = &mut self.dissipate;
        p.bind(gl);
        p.set_volume(gl, "uData", 0, data.data());
        p.set_f32(gl, "uDt", dt);
        p.set_f32(gl, "uRate", rate);
        slab.run(gl, p, data.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, data)
    }

    /// Delete the diffusion temporaries; the next diffuse allocates at the current sizes.
    pub unsafe fn release_scratch(&mut self, gl: &glow::Context) {
        for mut t in self.scratch.drain() {
            t.destroy(gl);
        }
    }

    /// Implicit viscous diffusion solved with `iterations` Jacobi steps.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn diffuse(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        data: &mut DataTexturePair,
        iterations: u32,
        viscosity: f32,
        dt: f32,
        dh: f32,
    ) -> Result<(), EngineError> {
        let Some((alpha, rbeta)) = diffusion_coefficients(viscosity, dt, dh) else {
            return Ok(());
        };
        if iterations == 0 {
            return Ok(());
        }

        let (size, format) = (data.size(), data.format());
        let b = self.scratch.get_or_try_insert(size, format, || {
            VolumeTexture::new(gl, size, format, glow::CLAMP_TO_EDGE)
        })?;

        let copy = &mut self.copy;
        copy.bind(gl);
        copy.set_volume(gl, "uData", 0, data.data());
        slab.run(gl, copy, b, SlabRegion::All)?;

        let scale = boundary_scale(self.boundary, data.format());
        jacobi(
            gl,
            slab,
            &mut self.jacobi,
            data,
            b,
            iterations,
            alpha,
            rbeta,
            scale,
        )
    }

    /// Make `velocity` divergence free.
    pub unsafe fn projection(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        velocity: &mut DataTexturePair,
        iterations: u32,
        dh: f32,
    ) -> Result<(), EngineError> {
        if iterations == 0 {
            return Ok(());
        }
        let half_inv_dh = 0.5 / dh;

        let p = &mut self.divergence_prog;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity.data());
        p.set_f32(gl, "uHalfInvDh", half_inv_dh);
        slab.run(gl, p, &self.divergence, SlabRegion::Interior)?;

        // Pressure keeps the previous solution as the initial guess.
        let (alpha, rbeta) = pressure_coefficients(dh);
        jacobi(
            gl,
            slab,
            &mut self.jacobi,
            &mut self.pressure,
            &self.divergence,
            iterations,
            alpha,
            rbeta,
            1.0,
        )?;

        let p = &mut self.gradient;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity.data());
        p.set_volume(gl, "uPressure", 1, self.pressure.data());
        p.set_f32(gl, "uHalfInvDh", half_inv_dh);
        slab.run(gl, p, velocity.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, velocity)
    }

    /// Vorticity confinement.
    pub unsafe fn vorticity(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        velocity: &mut DataTexturePair,
        scale: f32,
        dt: f32,
        dh: f32,
    ) -> Result<(), EngineError> {
        if scale == 0.0 {
            return Ok(());
        }
        let p = &mut self.curl_prog;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity.data());
        p.set_f32(gl, "uHalfInvDh", 0.5 / dh);
        slab.run(gl, p, &self.curl, SlabRegion::Interior)?;

        let p = &mut self.vorticity;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity.data());
        p.set_volume(gl, "uCurl", 1, &self.curl);
        p.set_f32(gl, "uDt", dt);
        p.set_f32(gl, "uScale", scale);
        p.set_f32(gl, "uDh", dh);
        slab.run(gl, p, velocity.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, velocity)
    }

    /// Uniform acceleration `force` over the whole interior.
    pub unsafe fn add_force(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        velocity: &mut DataTexturePair,
        force: Vec3,
        dt: f32,
    ) -> Result<(), EngineError> {
        if force == Vec3::ZERO {
            return Ok(());
        }
        let p = &mut self.force;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity.data());
        p.set_f32(gl, "uDt", dt);
        p.set_vec3(gl, "uForce", force.to_array());
        slab.run(gl, p, velocity.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, velocity)
    }

    /// Horizontal wind along the current `wind` direction.
    pub unsafe fn wind(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        velocity: &mut DataTexturePair,
        wind: &Wind,
        settings: &Settings,
        dt: f32,
    ) -> Result<(), EngineError> {
        self.add_force(gl, slab, velocity, wind.force(settings), dt)
    }

    /// Gaussian velocity impulse at `position` (cells).
    pub unsafe fn external_force(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        velocity: &mut DataTexturePair,
        position: Vec3,
        force: Vec3,
    ) -> Result<(), EngineError> {
        let p = &mut self.splat;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, velocity.data());
        p.set_vec3(gl, "uPosition", position.to_array());
        p.set_vec3(gl, "uForce", force.to_array());
        p.set_f32(gl, "uRadius", SPLAT_RADIUS_CELLS);
        slab.run(gl, p, velocity.result(), SlabRegion::Interior)?;
        self.finish(gl, slab, velocity)
    }

    /// Resample `coarse` into `fine` and add the tiled band noise.
    pub unsafe fn turbulence(
        &mut self,
        gl: &glow::Context,
        slab: &mut SlabOperator,
        coarse: &VolumeTexture,
        noise: &VolumeTexture,
        fine: &mut DataTexturePair,
    ) -> Result<(), EngineError> {
        let fine_size = fine.size().as_vec3();
        let noise_scale = fine_size / noise.size.as_vec3();

        let p = &mut self.turbulence;
        p.bind(gl);
        p.set_volume(gl, "uVelocity", 0, coarse);
        p.set_volume(gl, "uNoise", 1, noise);
        p.set_vec3(gl, "uNoiseScale", noise_scale.to_array());
        p.set_f32(gl, "uStrength", TURBULENCE_STRENGTH);
        slab.run(gl, p, fine.result(), SlabRegion::All)?;
        self.finish(gl, slab, fine)
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.divergence.destroy(gl);
        self.pressure.destroy(gl);
        self.curl.destroy(gl);
        self.release_scratch(gl);
        for p in [
            &mut self.copy,
            &mut self.advect,
            &mut self.buoyancy,
            &mut self.cooling,
            &mut self.add_source,
            &mut self.set_source,
            &mut self.dissipate,
            &mut self.jacobi,
            &mut self.divergence_prog,
            &mut self.gradient,
            &mut self.curl_prog,
            &mut self.vorticity,
            &mut self.force,
            &mut self.splat,
            &mut self.turbulence,
        ] {
            p.destroy(gl);
        }
    }
}

#[allow(clippy::too_many_arguments)]
unsafe fn jacobi(
    gl: &glow::Context,
    slab: &mut SlabOperator,
    program: &mut ShaderProgram,
    x: &mut DataTexturePair,
    b: &VolumeTexture,
    iterations: u32,
    alpha: f32,
    rbeta: f32,
    scale: f32,
) -> Result<(), EngineError> {
    for _ in 0..iterations {
        program.bind(gl);
        program.set_volume(gl, "uX", 0, x.data());
        program.set_volume(gl, "uB", 1, b);
        program.set_f32(gl, "uAlpha", alpha);
        program.set_f32(gl, "uRBeta", rbeta);
        slab.run(gl, program, x.result(), SlabRegion::Interior)?;
        x.swap();
        slab.set_boundary(gl, x, scale)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_walls_reflect_only_vectors() {
        assert_eq!(boundary_scale(BoundaryType::Some, VolumeFormat::Vector), -1.0);
        assert_eq!(boundary_scale(BoundaryType::Some, VolumeFormat::Scalar), 1.0);
        assert_eq!(boundary_scale(BoundaryType::None, VolumeFormat::Vector), 1.0);
    }

    #[test]
    fn diffusion_weights_balance() {
        assert_eq!(diffusion_coefficients(0.0, 0.1, 1.0), None);
        let (alpha, rbeta) = diffusion_coefficients(0.5, 0.1, 2.0).unwrap();
        assert!((alpha - 80.0).abs() < 1e-4);
        // A uniform field is a fixed point: (6x + alpha x) * rbeta == x.
        assert!(((6.0 + alpha) * rbeta - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pressure_weights() {
        let (alpha, rbeta) = pressure_coefficients(2.0);
        assert_eq!(alpha, -4.0);
        assert!((rbeta - 1.0 / 6.0).abs() < 1e-7);
    }
}
