//! Simulation and rendering settings.
//!
//! `Settings` is a plain serde struct: every field has a default so a settings file only
//! needs to name what it overrides. Runtime edits go through [`SettingsChange`], which
//! validates the result and reports whether simulation fields must be regenerated.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::load_typed_json;
use crate::error::EngineError;

/// How source fields are written into the simulated fields each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceMode {
    /// Source cells overwrite the field (`max(field, source)`).
    Set,
    /// Source cells are added, scaled by the time step.
    Add,
}

/// Shape of the emitting object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    SingleSphere,
    DualSpheres,
    Cube,
    Pyramid,
    Cylinder,
    Cone,
    Floor,
    Wall,
}

impl SourceType {
    pub const ALL: [SourceType; 8] = [
        SourceType::SingleSphere,
        SourceType::DualSpheres,
        SourceType::Cube,
        SourceType::Pyramid,
        SourceType::Cylinder,
        SourceType::Cone,
        SourceType::Floor,
        SourceType::Wall,
    ];
}

/// Boundary handling for the simulation box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryType {
    /// Open box: the outer shell copies its inward neighbour.
    None,
    /// Solid walls: velocity is reflected at the shell.
    Some,
}

/// Largest cell count accepted along any grid axis.
pub const MAX_GRID_AXIS: u32 = 256;

/// Upper bound for every Jacobi iteration count.
pub const MAX_ITERATIONS: u32 = 1000;

/// Which of the two simulation grids a query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Low resolution grid used for velocity and pressure.
    Velocity,
    /// High resolution grid used for smoke density and temperature.
    Substance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub name: String,

    /// Box proportions; multiplied by the per-grid scale to get cell counts.
    pub size_ratio: [u32; 3],
    pub velocity_scale: u32,
    pub substance_scale: u32,
    /// Length of one `size_ratio` unit in simulation units.
    pub simulation_scale: f32,
    pub delta_time: f32,

    pub source_mode: SourceMode,
    pub source_type: SourceType,
    pub source_temperature: f32,
    pub source_density: f32,
    pub source_radius: f32,
    pub source_velocity: f32,

    pub vel_kinematic_viscosity: f32,
    pub vel_diffusion_iterations: u32,
    pub temp_kinematic_viscosity: f32,
    pub temp_diffusion_iterations: u32,
    pub smoke_kinematic_viscosity: f32,
    pub smoke_diffusion_iterations: u32,

    pub vorticity_scale: f32,
    pub projection_iterations: u32,
    pub buoyancy_scale: f32,
    pub smoke_dissipation: f32,

    pub wind_strength: f32,
    pub wind_angle: f32,
    pub rotating_wind_angle: bool,

    pub background_color: [f32; 3],
    pub filter_color: [f32; 3],
    pub color_space: [f32; 3],

    pub min_band: f32,
    pub max_band: f32,
    pub custom_min_band: bool,
    pub custom_max_band: bool,

    /// When set, pointer drags orbit the camera instead of pushing the fluid.
    pub touch_mode: bool,
    /// When set, gravity follows the device rotation sensor.
    pub orientation_mode: bool,
    pub boundary_type: BoundaryType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            size_ratio: [1, 4, 1],
            velocity_scale: 12,
            substance_scale: 60,
            simulation_scale: 24.0,
            delta_time: 1.0 / 30.0,
            source_mode: SourceMode::Set,
            source_type: SourceType::SingleSphere,
            source_temperature: 3500.0,
            source_density: 0.4,
            source_radius: 8.0,
            source_velocity: 0.0,
            vel_kinematic_viscosity: 0.0,
            vel_diffusion_iterations: 0,
            temp_kinematic_viscosity: 0.0,
            temp_diffusion_iterations: 0,
            smoke_kinematic_viscosity: 0.0,
            smoke_diffusion_iterations: 0,
            vorticity_scale: 8.0,
            projection_iterations: 20,
            buoyancy_scale: 0.15,
            smoke_dissipation: 0.0,
            wind_strength: 0.0,
            wind_angle: 3.14,
            rotating_wind_angle: true,
            background_color: [0.0, 0.0, 0.0],
            filter_color: [1.0, 1.0, 1.0],
            color_space: [1.8, 2.2, 2.2],
            min_band: 2.0,
            max_band: 8.0,
            custom_min_band: false,
            custom_max_band: false,
            touch_mode: false,
            orientation_mode: false,
            boundary_type: BoundaryType::Some,
        }
    }
}

impl Settings {
    /// Load a settings file and validate it.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let settings: Settings = load_typed_json(path)?;
        settings.validate().map_err(|e| EngineError::InvalidConfig {
            path: path.to_path_buf(),
            msg: e.to_string(),
        })?;
        Ok(settings)
    }

    /// The built-in presets cycled by a click on the surface.
    pub fn presets() -> [Settings; 3] {
        let default = Settings::default();
        let few = default
            .clone()
            .with_projection_iterations(10)
            .with_name("Few Iterations");
        let example = default
            .clone()
            .with_projection_iterations(34)
            .with_vorticity_scale(6.0)
            .with_name("Example");
        [default, few, example]
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.size_ratio.iter().any(|&r| r == 0) {
            return Err(EngineError::InvalidSettings(
                "size_ratio components must be > 0".into(),
            ));
        }
        if self.velocity_scale == 0 || self.substance_scale == 0 {
            return Err(EngineError::InvalidSettings(
                "velocity_scale and substance_scale must be > 0".into(),
            ));
        }
        for res in [Resolution::Velocity, Resolution::Substance] {
            let scale = self.scale(res);
            let too_big = self
                .size_ratio
                .iter()
                .any(|&r| r.checked_mul(scale).map_or(true, |n| n > MAX_GRID_AXIS));
            if too_big {
                return Err(EngineError::InvalidSettings(format!(
                    "{res:?} grid {:?} x {scale} exceeds {MAX_GRID_AXIS} cells per axis",
                    self.size_ratio
                )));
            }
        }
        let iterations = [
            self.projection_iterations,
            self.vel_diffusion_iterations,
            self.temp_diffusion_iterations,
            self.smoke_diffusion_iterations,
        ];
        if iterations.iter().any(|&n| n > MAX_ITERATIONS) {
            return Err(EngineError::InvalidSettings(format!(
                "solver iterations must not exceed {MAX_ITERATIONS}"
            )));
        }
        if !(self.simulation_scale.is_finite() && self.simulation_scale > 0.0) {
            return Err(EngineError::InvalidSettings(
                "simulation_scale must be > 0".into(),
            ));
        }
        if !(self.delta_time.is_finite() && self.delta_time > 0.0) {
            return Err(EngineError::InvalidSettings("delta_time must be > 0".into()));
        }
        if self.min_band > self.max_band {
            return Err(EngineError::InvalidSettings(format!(
                "min_band ({}) must not exceed max_band ({})",
                self.min_band, self.max_band
            )));
        }
        Ok(())
    }

    // ---- Derived sizes ----

    pub fn scale(&self, res: Resolution) -> u32 {
        match res {
            Resolution::Velocity => self.velocity_scale,
            Resolution::Substance => self.substance_scale,
        }
    }

    /// Cell counts of the grid for `res`. Saturates on settings that fail `validate`.
    pub fn size(&self, res: Resolution) -> [u32; 3] {
        let s = self.scale(res);
        self.size_ratio.map(|r| r.saturating_mul(s))
    }

    /// Simulation units covered by one cell of the grid for `res`.
    pub fn res_to_sim_factor(&self, res: Resolution) -> f32 {
        self.simulation_scale / self.scale(res) as f32
    }

    /// Extent of the simulated box in simulation units.
    pub fn simulation_size(&self) -> [f32; 3] {
        [
            self.size_ratio[0] as f32 * self.simulation_scale,
            self.size_ratio[1] as f32 * self.simulation_scale,
            self.size_ratio[2] as f32 * self.simulation_scale,
        ]
    }

    /// Ratio between the substance and velocity resolutions.
    pub fn res_scale(&self) -> f32 {
        self.substance_scale as f32 / self.velocity_scale as f32
    }

    // ---- Builder ----

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_size(
        mut self,
        size_ratio: [u32; 3],
        velocity_scale: u32,
        substance_scale: u32,
        simulation_scale: f32,
    ) -> Self {
        self.size_ratio = size_ratio;
        self.velocity_scale = velocity_scale;
        self.substance_scale = substance_scale;
        self.simulation_scale = simulation_scale;
        self
    }

    pub fn with_delta_time(mut self, dt: f32) -> Self {
        self.delta_time = dt;
        self
    }

    pub fn with_source_mode(mut self, mode: SourceMode) -> Self {
        self.source_mode = mode;
        self
    }

    pub fn with_source_type(mut self, ty: SourceType) -> Self {
        self.source_type = ty;
        self
    }

    pub fn with_source_temperature(mut self, t: f32) -> Self {
        self.source_temperature = t;
        self
    }

    pub fn with_source_density(mut self, d: f32) -> Self {
        self.source_density = d;
        self
    }

    pub fn with_source_radius(mut self, r: f32) -> Self {
        self.source_radius = r;
        self
    }

    pub fn with_source_velocity(mut self, v: f32) -> Self {
        self.source_velocity = v;
        self
    }

    pub fn with_vel_diffusion(mut self, viscosity: f32, iterations: u32) -> Self {
        self.vel_kinematic_viscosity = viscosity;
        self.vel_diffusion_iterations = iterations;
        self
    }

    pub fn with_temp_diffusion(mut self, viscosity: f32, iterations: u32) -> Self {
        self.temp_kinematic_viscosity = viscosity;
        self.temp_diffusion_iterations = iterations;
        self
    }

    pub fn with_smoke_diffusion(mut self, viscosity: f32, iterations: u32) -> Self {
        self.smoke_kinematic_viscosity = viscosity;
        self.smoke_diffusion_iterations = iterations;
        self
    }

    pub fn with_vorticity_scale(mut self, scale: f32) -> Self {
        self.vorticity_scale = scale;
        self
    }

    pub fn with_projection_iterations(mut self, iterations: u32) -> Self {
        self.projection_iterations = iterations;
        self
    }

    pub fn with_buoyancy_scale(mut self, scale: f32) -> Self {
        self.buoyancy_scale = scale;
        self
    }

    pub fn with_smoke_dissipation(mut self, dissipation: f32) -> Self {
        self.smoke_dissipation = dissipation;
        self
    }

    pub fn with_wind_strength(mut self, strength: f32) -> Self {
        self.wind_strength = strength;
        self
    }

    pub fn with_wind_angle(mut self, angle: f32) -> Self {
        self.wind_angle = angle;
        self
    }

    pub fn with_rotating_wind_angle(mut self, rotating: bool) -> Self {
        self.rotating_wind_angle = rotating;
        self
    }

    pub fn with_background_color(mut self, rgb: [f32; 3]) -> Self {
        self.background_color = rgb;
        self
    }

    pub fn with_filter_color(mut self, rgb: [f32; 3]) -> Self {
        self.filter_color = rgb;
        self
    }

    pub fn with_color_space(mut self, xyz: [f32; 3]) -> Self {
        self.color_space = xyz;
        self
    }

    pub fn with_min_band(mut self, band: f32) -> Self {
        self.min_band = band;
        self
    }

    pub fn with_max_band(mut self, band: f32) -> Self {
        self.max_band = band;
        self
    }

    pub fn with_custom_min_band(mut self, custom: bool) -> Self {
        self.custom_min_band = custom;
        self
    }

    pub fn with_custom_max_band(mut self, custom: bool) -> Self {
        self.custom_max_band = custom;
        self
    }

    pub fn with_touch_mode(mut self, touch_mode: bool) -> Self {
        self.touch_mode = touch_mode;
        self
    }

    pub fn with_orientation_mode(mut self, orientation_mode: bool) -> Self {
        self.orientation_mode = orientation_mode;
        self
    }

    pub fn with_boundary_type(mut self, boundary: BoundaryType) -> Self {
        self.boundary_type = boundary;
        self
    }
}

/// Cycles through [`Settings::presets`], starting with the default preset.
#[derive(Debug, Default, Clone)]
pub struct PresetCycle {
    next: usize,
}

impl PresetCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_settings(&mut self) -> Settings {
        let presets = Settings::presets();
        let idx = self.next % presets.len();
        self.next = (idx + 1) % presets.len();
        presets[idx].clone()
    }
}

/// Accepts the object names used by the control surface (`"SPHERE"`, `"CUBE"`, ...).
pub fn parse_source_type(s: &str) -> Option<SourceType> {
    match s {
        "SPHERE" => Some(SourceType::SingleSphere),
        "CUBE" => Some(SourceType::Cube),
        "PYRAMID" => Some(SourceType::Pyramid),
        "CYLINDER" => Some(SourceType::Cylinder),
        "CONE" => Some(SourceType::Cone),
        "FLOOR" => Some(SourceType::Floor),
        "WALL" => Some(SourceType::Wall),
        "DUALSPHERES" => Some(SourceType::DualSpheres),
        _ => None,
    }
}

pub fn parse_boundary_type(s: &str) -> Option<BoundaryType> {
    match s {
        "NONE" => Some(BoundaryType::None),
        "SOME" => Some(BoundaryType::Some),
        _ => None,
    }
}

/// One runtime edit to the active settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsChange {
    TouchMode(bool),
    Orientation(bool),
    /// New low (velocity) resolution; the substance resolution keeps its ratio.
    Resolution(u32),
    /// New substance/velocity resolution ratio.
    ResolutionScale(f32),
    SimulationScale(f32),
    /// Simulation steps per second.
    TimeStep(f32),
    BackgroundColor([f32; 3]),
    FilterColor([f32; 3]),
    ColorSpace([f32; 3]),
    ObjectType(SourceType),
    ObjectRadius(f32),
    ObjectTemperature(f32),
    ObjectDensity(f32),
    ObjectVelocity(f32),
    WindStrength(f32),
    /// `true` selects a fixed, user-set wind angle.
    CustomWindAngle(bool),
    WindAngle(f32),
    Vorticity(f32),
    Buoyancy(f32),
    SmokeDissipation(f32),
    TemperatureViscosity(f32),
    SmokeViscosity(f32),
    VelocityViscosity(f32),
    CustomMinNoiseBand(bool),
    MinNoiseBand(f32),
    CustomMaxNoiseBand(bool),
    MaxNoiseBand(f32),
    DensityDiffusionIterations(u32),
    VelocityDiffusionIterations(u32),
    ProjectionIterations(u32),
    Boundaries(BoundaryType),
}

/// What an applied change requires from the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeEffect {
    /// Grid sizes, sources or noise changed; fields must be rebuilt.
    pub regen_fields: bool,
}

impl SettingsChange {
    /// Whether applying this change rebuilds the simulation fields.
    pub fn regenerates_fields(&self) -> bool {
        use SettingsChange::*;
        matches!(
            self,
            Resolution(_)
                | ResolutionScale(_)
                | SimulationScale(_)
                | ObjectType(_)
                | ObjectRadius(_)
                | ObjectTemperature(_)
                | ObjectDensity(_)
                | ObjectVelocity(_)
                | CustomMinNoiseBand(_)
                | MinNoiseBand(_)
                | CustomMaxNoiseBand(_)
                | MaxNoiseBand(_)
        )
    }

    /// Apply to `settings`. On error `settings` is left untouched.
    pub fn apply(&self, settings: &mut Settings) -> Result<ChangeEffect, EngineError> {
        use SettingsChange::*;

        let mut next = settings.clone();
        match *self {
            TouchMode(v) => next.touch_mode = v,
            Orientation(v) => next.orientation_mode = v,
            Resolution(lower) => {
                let upper = (next.res_scale() * lower as f32).round() as u32;
                next.velocity_scale = lower;
                next.substance_scale = upper;
            }
            ResolutionScale(scale) => {
                next.substance_scale = (next.velocity_scale as f32 * scale).round() as u32;
            }
            SimulationScale(scale) => next.simulation_scale = scale,
            TimeStep(steps) => {
                if !(steps.is_finite() && steps > 0.0) {
                    return Err(EngineError::InvalidSettings(format!(
                        "time step must be > 0 steps/s, got {steps}"
                    )));
                }
                next.delta_time = 1.0 / steps;
            }
            BackgroundColor(rgb) => next.background_color = rgb,
            FilterColor(rgb) => next.filter_color = rgb,
            ColorSpace(xyz) => next.color_space = xyz,
            ObjectType(ty) => next.source_type = ty,
            ObjectRadius(r) => next.source_radius = r,
            ObjectTemperature(t) => next.source_temperature = t,
            ObjectDensity(d) => next.source_density = d,
            ObjectVelocity(v) => next.source_velocity = v,
            WindStrength(s) => next.wind_strength = s,
            CustomWindAngle(custom) => next.rotating_wind_angle = !custom,
            WindAngle(a) => next.wind_angle = a,
            Vorticity(v) => next.vorticity_scale = v,
            Buoyancy(b) => next.buoyancy_scale = b,
            SmokeDissipation(d) => next.smoke_dissipation = d,
            TemperatureViscosity(v) => next.temp_kinematic_viscosity = v,
            SmokeViscosity(v) => next.smoke_kinematic_viscosity = v,
            VelocityViscosity(v) => next.vel_kinematic_viscosity = v,
            CustomMinNoiseBand(custom) => next.custom_min_band = custom,
            MinNoiseBand(b) => next.min_band = b,
            CustomMaxNoiseBand(custom) => next.custom_max_band = custom,
            MaxNoiseBand(b) => next.max_band = b,
            DensityDiffusionIterations(n) => next.smoke_diffusion_iterations = n,
            VelocityDiffusionIterations(n) => next.vel_diffusion_iterations = n,
            ProjectionIterations(n) => next.projection_iterations = n,
            Boundaries(b) => next.boundary_type = b,
        }

        next.validate()?;
        *settings = next;
        Ok(ChangeEffect {
            regen_fields: self.regenerates_fields(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sizes_follow_ratio_and_scales() {
        let s = Settings::default();
        assert_eq!(s.size(Resolution::Velocity), [12, 48, 12]);
        assert_eq!(s.size(Resolution::Substance), [60, 240, 60]);
        assert_eq!(s.simulation_size(), [24.0, 96.0, 24.0]);
        assert!((s.res_to_sim_factor(Resolution::Velocity) - 2.0).abs() < 1e-6);
        assert!((s.res_to_sim_factor(Resolution::Substance) - 0.4).abs() < 1e-6);
        assert!((s.res_scale() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn presets_cycle_from_default() {
        let mut cycle = PresetCycle::new();
        let names: Vec<String> = (0..4).map(|_| cycle.next_settings().name).collect();
        assert_eq!(names, ["Default", "Few Iterations", "Example", "Default"]);

        let presets = Settings::presets();
        assert_eq!(presets[1].projection_iterations, 10);
        assert_eq!(presets[2].projection_iterations, 34);
        assert_eq!(presets[2].vorticity_scale, 6.0);
    }

    #[test]
    fn resolution_change_keeps_substance_ratio() {
        let mut s = Settings::default();
        let effect = SettingsChange::Resolution(10).apply(&mut s).unwrap();
        assert!(effect.regen_fields);
        assert_eq!(s.velocity_scale, 10);
        assert_eq!(s.substance_scale, 50);
    }

    #[test]
    fn resolution_scale_and_time_step() {
        let mut s = Settings::default();
        SettingsChange::ResolutionScale(3.0).apply(&mut s).unwrap();
        assert_eq!(s.substance_scale, 36);

        let effect = SettingsChange::TimeStep(60.0).apply(&mut s).unwrap();
        assert!(!effect.regen_fields);
        assert!((s.delta_time - 1.0 / 60.0).abs() < 1e-7);
    }

    #[test]
    fn invalid_change_leaves_settings_untouched() {
        let mut s = Settings::default();
        let before = s.clone();
        assert!(SettingsChange::TimeStep(0.0).apply(&mut s).is_err());
        assert!(SettingsChange::Resolution(0).apply(&mut s).is_err());
        assert!(SettingsChange::MinNoiseBand(20.0).apply(&mut s).is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn oversized_grids_are_rejected() {
        let mut s = Settings::default();
        let before = s.clone();
        assert!(SettingsChange::Resolution(1_500_000_000).apply(&mut s).is_err());
        // 2000 * ratio 4 is far past the per-axis limit on both grids.
        assert!(SettingsChange::Resolution(2000).apply(&mut s).is_err());
        assert!(SettingsChange::ResolutionScale(100.0).apply(&mut s).is_err());
        assert!(SettingsChange::ProjectionIterations(u32::MAX).apply(&mut s).is_err());
        assert_eq!(s, before);

        // Largest substance grid that still fits: 4 * 64 = 256.
        SettingsChange::ResolutionScale(64.0 / 12.0).apply(&mut s).unwrap();
        assert_eq!(s.size(Resolution::Substance), [64, 256, 64]);
    }

    #[test]
    fn size_saturates_instead_of_overflowing() {
        let s = Settings {
            velocity_scale: u32::MAX,
            ..Settings::default()
        };
        assert!(s.validate().is_err());
        assert_eq!(s.size(Resolution::Velocity)[1], u32::MAX);
    }

    #[test]
    fn custom_wind_angle_disables_rotation() {
        let mut s = Settings::default();
        assert!(s.rotating_wind_angle);
        SettingsChange::CustomWindAngle(true).apply(&mut s).unwrap();
        assert!(!s.rotating_wind_angle);
    }

    #[test]
    fn regen_flags_match_field_dependencies() {
        assert!(SettingsChange::ObjectType(SourceType::Cube).regenerates_fields());
        assert!(SettingsChange::MaxNoiseBand(6.0).regenerates_fields());
        assert!(!SettingsChange::Vorticity(2.0).regenerates_fields());
        assert!(!SettingsChange::Boundaries(BoundaryType::None).regenerates_fields());
        assert!(!SettingsChange::BackgroundColor([0.1, 0.2, 0.3]).regenerates_fields());
    }

    #[test]
    fn parses_control_surface_names() {
        assert_eq!(parse_source_type("SPHERE"), Some(SourceType::SingleSphere));
        assert_eq!(parse_source_type("DUALSPHERES"), Some(SourceType::DualSpheres));
        assert_eq!(parse_source_type("sphere"), None);
        assert_eq!(parse_boundary_type("NONE"), Some(BoundaryType::None));
        assert_eq!(parse_boundary_type("ALL"), None);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{ "name": "Tall", "velocity_scale": 8 }"#).unwrap();
        assert_eq!(s.name, "Tall");
        assert_eq!(s.velocity_scale, 8);
        assert_eq!(s.substance_scale, 60);
        assert_eq!(s.source_type, SourceType::SingleSphere);
    }
}
