//! Parameter names understood over OSC and their settings changes.

use pyre_core::{parse_boundary_type, parse_source_type, SettingsChange};

use crate::{ControlError, ParamValue};

pub const PARAM_NAMES: [&str; 31] = [
    "touch_mode",
    "orientation",
    "resolution",
    "resolution_scale",
    "simulation_scale",
    "time_step",
    "background_color",
    "filter_color",
    "color_space",
    "object_type",
    "object_radius",
    "object_temperature",
    "object_density",
    "object_velocity",
    "wind_strength",
    "custom_wind_angle",
    "wind_angle",
    "vorticity",
    "buoyancy",
    "smoke_dissipation",
    "temperature_viscosity",
    "smoke_viscosity",
    "velocity_viscosity",
    "custom_min_noise_band",
    "min_noise_band",
    "custom_max_noise_band",
    "max_noise_band",
    "density_diffusion_iterations",
    "velocity_diffusion_iterations",
    "projection_iterations",
    "boundaries",
];

fn bad(name: &str, expected: &'static str, got: &ParamValue) -> ControlError {
    ControlError::BadValue {
        name: name.to_string(),
        expected,
        got: got.clone(),
    }
}

fn float(name: &str, v: &ParamValue) -> Result<f32, ControlError> {
    match *v {
        ParamValue::Number(x) if x.is_finite() => Ok(x),
        _ => Err(bad(name, "a number", v)),
    }
}

fn count(name: &str, v: &ParamValue) -> Result<u32, ControlError> {
    match *v {
        ParamValue::Number(x) if (0.0..u32::MAX as f32).contains(&x) => Ok(x.round() as u32),
        _ => Err(bad(name, "a non-negative count", v)),
    }
}

/// Booleans, or numbers where non-zero means on.
fn flag(name: &str, v: &ParamValue) -> Result<bool, ControlError> {
    match *v {
        ParamValue::Flag(b) => Ok(b),
        ParamValue::Number(x) => Ok(x != 0.0),
        _ => Err(bad(name, "a flag", v)),
    }
}

fn triple(name: &str, v: &ParamValue) -> Result<[f32; 3], ControlError> {
    match *v {
        ParamValue::Triple(t) => Ok(t),
        _ => Err(bad(name, "three numbers", v)),
    }
}

fn text<'a>(name: &str, v: &'a ParamValue) -> Result<&'a str, ControlError> {
    match v {
        ParamValue::Text(s) => Ok(s),
        _ => Err(bad(name, "a string", v)),
    }
}

/// Map an OSC parameter to the settings change it requests.
pub fn settings_change_for(name: &str, value: &ParamValue) -> Result<SettingsChange, ControlError> {
    use SettingsChange::*;

    let n = name;
    let change = match name {
        "touch_mode" => TouchMode(flag(n, value)?),
        "orientation" => Orientation(flag(n, value)?),
        "resolution" => Resolution(count(n, value)?),
        "resolution_scale" => ResolutionScale(float(n, value)?),
        "simulation_scale" => SimulationScale(float(n, value)?),
        "time_step" => TimeStep(float(n, value)?),
        "background_color" => BackgroundColor(triple(n, value)?),
        "filter_color" => FilterColor(triple(n, value)?),
        "color_space" => ColorSpace(triple(n, value)?),
        "object_type" => {
            let s = text(n, value)?;
            ObjectType(parse_source_type(s).ok_or_else(|| bad(n, "an object type", value))?)
        }
        "object_radius" => ObjectRadius(float(n, value)?),
        "object_temperature" => ObjectTemperature(float(n, value)?),
        "object_density" => ObjectDensity(float(n, value)?),
        "object_velocity" => ObjectVelocity(float(n, value)?),
        "wind_strength" => WindStrength(float(n, value)?),
        "custom_wind_angle" => CustomWindAngle(flag(n, value)?),
        "wind_angle" => WindAngle(float(n, value)?),
        "vorticity" => Vorticity(float(n, value)?),
        "buoyancy" => Buoyancy(float(n, value)?),
        "smoke_dissipation" => SmokeDissipation(float(n, value)?),
        "temperature_viscosity" => TemperatureViscosity(float(n, value)?),
        "smoke_viscosity" => SmokeViscosity(float(n, value)?),
        "velocity_viscosity" => VelocityViscosity(float(n, value)?),
        "custom_min_noise_band" => CustomMinNoiseBand(flag(n, value)?),
        "min_noise_band" => MinNoiseBand(float(n, value)?),
        "custom_max_noise_band" => CustomMaxNoiseBand(flag(n, value)?),
        "max_noise_band" => MaxNoiseBand(float(n, value)?),
        "density_diffusion_iterations" => DensityDiffusionIterations(count(n, value)?),
        "velocity_diffusion_iterations" => VelocityDiffusionIterations(count(n, value)?),
        "projection_iterations" => ProjectionIterations(count(n, value)?),
        "boundaries" => {
            let s = text(n, value)?;
            Boundaries(parse_boundary_type(s).ok_or_else(|| bad(n, "NONE or SOME", value))?)
        }
        _ => return Err(ControlError::UnknownParam(name.to_string())),
    };
    Ok(change)
}
