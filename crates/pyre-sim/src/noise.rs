//! Deterministic gradient noise and the band-limited turbulence volume built from it.

use std::f64::consts::PI;

use glam::Vec3;
use pyre_core::Settings;

use crate::grid::GridSize;

/// Edge length of the tiled noise volume used for turbulence.
pub const NOISE_TILE: u32 = 32;

pub const DEFAULT_MIN_BAND: f32 = 2.0;
pub const DEFAULT_MAX_BAND: f32 = 8.0;

const SEED: [i64; 3] = [3571, 7919, 1597];

#[rustfmt::skip]
const ANGLE: [u16; 256] = [
    163,  81,  50,  50,  92, 164, 154,  19, 274, 221,  16, 174, 266,  59,   4, 302,
     65, 171, 124,  96, 306, 230,   7, 314, 241, 247, 142,  81, 193,  92, 267, 227,
      1, 257, 315, 118, 108,   3, 120, 211,  36,  44,  29, 256, 179, 331,  78,  31,
    317,  29, 345, 288, 253, 187, 227,  60,  48,  78, 208, 211,  79, 239, 123, 127,
      3, 277, 238, 271,   8, 194, 252, 263,  32, 301, 249,  98, 136,  98, 208, 206,
    344, 170, 249, 250, 197, 342, 325, 228,  55, 196, 339, 358, 205,  59,   4, 125,
    122, 247,  50, 161,   7,  80, 349, 247,  87, 278, 314, 302, 326, 204, 271, 139,
     77, 330, 143, 236, 275, 245, 131, 100,  94,  44, 122, 202, 353, 295, 121,  22,
      0, 157,  64, 255, 329,  55, 332,  52,  61, 192, 125,  43,  56, 270, 356, 263,
     30,  50, 236, 156, 135,  17,  39, 148,  27,  28, 348, 233, 313,  52, 245, 126,
    282, 299, 305, 252, 258,  99, 207,  33, 201, 198, 141, 222, 115, 298, 114,  38,
    327, 274,  63,  76,  68, 308, 138, 326, 278, 338, 331, 308, 347, 281,  31, 320,
    322, 168, 301, 228, 185,  57, 297,  35,  94, 346, 177,  75, 344, 255, 150,  77,
    242,   7,  88,  19,  79, 206, 211, 188, 255, 279, 320, 133, 226, 344, 209, 273,
     75,  67, 221, 209,  25, 324,  35,  11,   1, 184, 273, 102, 302, 268, 169, 290,
    241, 283,  42, 305,  18, 255, 317, 316, 241, 154,  40, 258, 128, 187,  45, 355,
];

const CORNERS: [[i64; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

fn angle(a: i64, b: i64) -> f64 {
    let i = a.wrapping_mul(a).wrapping_add(b).rem_euclid(256) as usize;
    ANGLE[i] as f64
}

fn gradient(c: [i64; 3]) -> [f64; 3] {
    let yaw = (angle(c[0], c[1]) + angle(c[1], c[0])) / 180.0 * PI;
    let pitch = (angle(c[0], c[2]) + angle(c[2], c[0])) / 180.0 * PI;
    [yaw.cos() * pitch.cos(), yaw.sin() * pitch.cos(), pitch.sin()]
}

/// Gradient noise at `(x, y, z)`; zero on integer lattice points, roughly in [-1, 1].
pub fn perlin(x: f64, y: f64, z: f64) -> f64 {
    let base = [x.floor(), y.floor(), z.floor()];
    let local = [x - base[0], y - base[1], z - base[2]];

    let mut dots = [0.0; 8];
    for (dot, corner) in dots.iter_mut().zip(CORNERS) {
        let lattice = [
            base[0] as i64 + corner[0] + SEED[0],
            base[1] as i64 + corner[1] + SEED[1],
            base[2] as i64 + corner[2] + SEED[2],
        ];
        let g = gradient(lattice);
        *dot = g[0] * (local[0] - corner[0] as f64)
            + g[1] * (local[1] - corner[1] as f64)
            + g[2] * (local[2] - corner[2] as f64);
    }

    let (u, v, w) = (fade(local[0]), fade(local[1]), fade(local[2]));
    lerp(
        lerp(lerp(dots[0], dots[1], u), lerp(dots[2], dots[3], u), v),
        lerp(lerp(dots[4], dots[5], u), lerp(dots[6], dots[7], u), v),
        w,
    )
}

/// Inclusive band range (log2 frequencies) the turbulence noise covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseBands {
    pub min: f32,
    pub max: f32,
}

impl Default for NoiseBands {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_BAND,
            max: DEFAULT_MAX_BAND,
        }
    }
}

impl NoiseBands {
    /// Configured bands where the matching custom flag is set, defaults otherwise.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min: if settings.custom_min_band {
                settings.min_band
            } else {
                DEFAULT_MIN_BAND
            },
            max: if settings.custom_max_band {
                settings.max_band
            } else {
                DEFAULT_MAX_BAND
            },
        }
    }

    /// Integer octaves inside the band range.
    pub fn octaves(&self) -> impl Iterator<Item = i32> {
        self.min.ceil() as i32..=self.max.floor() as i32
    }
}

/// Sum of octaves `2^k` for `k` in the band range, weighted by `2^(-5k/6)` and
/// normalised by the total weight. Empty ranges yield zero.
pub fn band_noise(p: Vec3, bands: NoiseBands) -> f32 {
    let mut sum = 0.0;
    let mut total = 0.0;
    for k in bands.octaves() {
        let freq = 2f64.powi(k);
        let weight = 2f64.powf(-(k as f64) * 5.0 / 6.0);
        // Offset each octave so lattice zeros do not line up across bands.
        let shift = k as f64 * 17.31;
        sum += weight
            * perlin(
                p.x as f64 * freq + shift,
                p.y as f64 * freq + shift,
                p.z as f64 * freq + shift,
            );
        total += weight;
    }
    if total > 0.0 {
        (sum / total) as f32
    } else {
        0.0
    }
}

const CHANNEL_OFFSETS: [Vec3; 3] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(31.416, 47.853, 12.793),
    Vec3::new(73.156, 9.421, 58.624),
];

/// Three decorrelated band-noise channels sampled at cell centres of `size`
/// (normalised to the unit cube), in [`GridSize::index`] order.
pub fn noise_volume(size: GridSize, bands: NoiseBands) -> Vec<[f32; 3]> {
    let extent = size.as_vec3();
    size.cells()
        .map(|(x, y, z)| {
            let p = (Vec3::new(x as f32, y as f32, z as f32) + 0.5) / extent;
            [
                band_noise(p + CHANNEL_OFFSETS[0], bands),
                band_noise(p + CHANNEL_OFFSETS[1], bands),
                band_noise(p + CHANNEL_OFFSETS[2], bands),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perlin_is_deterministic_and_zero_on_lattice() {
        assert_eq!(perlin(0.3, 1.7, 2.2), perlin(0.3, 1.7, 2.2));
        assert!(perlin(3.0, -2.0, 5.0).abs() < 1e-12);

        let mut any_nonzero = false;
        for i in 0..200 {
            let t = i as f64 * 0.137;
            let v = perlin(t, t * 0.7 + 0.2, 1.3 - t);
            assert!(v.abs() <= 1.5, "perlin out of range: {v}");
            any_nonzero |= v.abs() > 1e-3;
        }
        assert!(any_nonzero);
    }

    #[test]
    fn bands_fall_back_to_defaults() {
        let s = Settings::default().with_min_band(3.0).with_max_band(5.0);
        assert_eq!(NoiseBands::from_settings(&s), NoiseBands::default());

        let s = s.with_custom_min_band(true);
        let b = NoiseBands::from_settings(&s);
        assert_eq!((b.min, b.max), (3.0, DEFAULT_MAX_BAND));
        assert_eq!(b.octaves().collect::<Vec<_>>(), vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn empty_band_range_is_silent() {
        let bands = NoiseBands { min: 2.2, max: 2.8 };
        assert_eq!(bands.octaves().count(), 0);
        assert_eq!(band_noise(Vec3::new(0.3, 0.4, 0.5), bands), 0.0);
    }

    #[test]
    fn volume_channels_differ() {
        let size = GridSize::cube(6);
        let v = noise_volume(size, NoiseBands { min: 1.0, max: 3.0 });
        assert_eq!(v.len(), size.voxel_count());
        let differs = v.iter().any(|c| (c[0] - c[1]).abs() > 1e-4);
        assert!(differs);
        assert!(v.iter().flatten().all(|x| x.is_finite()));
    }
}
