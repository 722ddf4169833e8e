//! Blackbody emission at representative RGB wavelengths.
//!
//! Wavelengths are in micrometres so the GLSL port stays within `f32` range.

/// Red, green and blue sample wavelengths (µm).
pub const WAVELENGTHS_UM: [f32; 3] = [0.630, 0.532, 0.465];

/// First radiation constant `2hc^2` in W·µm⁴/(m²·sr).
pub const PLANCK_C1: f64 = 1.191_042_97e8;
/// Second radiation constant `hc/k` in µm·K.
pub const PLANCK_C2: f64 = 1.438_776_9e4;

/// Spectral radiance at `lambda_um` for a body at `kelvin`. Zero at or below 0 K.
pub fn planck(lambda_um: f64, kelvin: f64) -> f64 {
    if kelvin <= 0.0 {
        return 0.0;
    }
    let denom = lambda_um.powi(5) * ((PLANCK_C2 / (lambda_um * kelvin)).exp() - 1.0);
    if denom.is_finite() && denom > 0.0 {
        PLANCK_C1 / denom
    } else {
        0.0
    }
}

pub fn radiance(kelvin: f32) -> [f32; 3] {
    WAVELENGTHS_UM.map(|l| planck(l as f64, kelvin as f64) as f32)
}

/// Factor mapping the brightest channel at `max_kelvin` to 1.
pub fn emission_scale(max_kelvin: f32) -> f32 {
    let peak = radiance(max_kelvin).into_iter().fold(0.0f32, f32::max);
    if peak > 0.0 {
        1.0 / peak
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hotter_is_brighter_and_bluer() {
        let warm = radiance(1500.0);
        let hot = radiance(3500.0);
        for c in 0..3 {
            assert!(hot[c] > warm[c]);
        }
        assert!(hot[0] > hot[2]);
        assert!(hot[2] / hot[0] > warm[2] / warm[0]);
    }

    #[test]
    fn scale_normalises_the_source_temperature() {
        let s = emission_scale(3500.0);
        let peak = radiance(3500.0).into_iter().fold(0.0f32, f32::max);
        assert!((peak * s - 1.0).abs() < 1e-5);
        assert_eq!(emission_scale(0.0), 0.0);
        assert_eq!(planck(0.5, -10.0), 0.0);
    }
}
