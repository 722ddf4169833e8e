//! Backend-agnostic pieces of the fire simulation: grid bookkeeping, emitter fields,
//! turbulence noise, camera and touch math.
#![forbid(unsafe_code)]
#![deny(missing_debug_implementations)]

pub mod blackbody;
pub mod camera;
pub mod grid;
pub mod noise;
pub mod sources;
pub mod touch;
pub mod wind;

pub use camera::{OrbitCamera, VolumeTransform};
pub use grid::GridSize;
pub use noise::{band_noise, noise_volume, perlin, NoiseBands, NOISE_TILE};
pub use sources::SourceFields;
pub use touch::{drag_to_grid, screen_to_grid, screen_to_ndc};
pub use wind::Wind;
