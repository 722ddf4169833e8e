//! Emitter fields written into the simulation every step.

use glam::Vec3;
use pyre_core::{Resolution, Settings, SourceType};

use crate::grid::GridSize;

/// Density, temperature and velocity sources for one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFields {
    pub size: GridSize,
    pub density: Vec<f32>,
    pub temperature: Vec<f32>,
    pub velocity: Vec<[f32; 3]>,
}

/// Emitter shape resolved to cell units.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Emitter {
    kind: SourceType,
    center: Vec3,
    radius: f32,
}

impl Emitter {
    fn contains(&self, size: GridSize, p: Vec3) -> bool {
        let r = self.radius;
        let d = p - self.center;
        match self.kind {
            SourceType::SingleSphere => d.length() <= r,
            SourceType::DualSpheres => {
                let offset = Vec3::new(1.2 * r, 0.0, 0.0);
                (d - offset).length() <= r || (d + offset).length() <= r
            }
            SourceType::Cube => d.abs().max_element() <= r,
            SourceType::Pyramid => {
                let half = (r - d.y) * 0.5;
                d.y.abs() <= r && d.x.abs() <= half && d.z.abs() <= half
            }
            SourceType::Cylinder => d.y.abs() <= r && (d.x * d.x + d.z * d.z).sqrt() <= r,
            SourceType::Cone => {
                let half = (r - d.y) * 0.5;
                d.y.abs() <= r && (d.x * d.x + d.z * d.z).sqrt() <= half
            }
            SourceType::Floor => p.y >= 1.0 && p.y <= 2.0,
            SourceType::Wall => p.x >= 1.0 && p.x <= 2.0 && p.y < size.height as f32 - 1.0,
        }
    }
}

impl SourceFields {
    /// Build the sources for the grid `res` describes under `settings`.
    ///
    /// The outer one-cell shell never emits.
    pub fn generate(settings: &Settings, res: Resolution) -> Self {
        let size = GridSize::from_ivec(settings.size(res));
        let radius = settings.source_radius / settings.res_to_sim_factor(res);
        let emitter = Emitter {
            kind: settings.source_type,
            center: Vec3::new(
                size.width as f32 * 0.5,
                radius + 1.0,
                size.depth as f32 * 0.5,
            ),
            radius,
        };

        let n = size.voxel_count();
        let mut density = vec![0.0; n];
        let mut temperature = vec![0.0; n];
        let mut velocity = vec![[0.0; 3]; n];

        for (x, y, z) in size.cells() {
            if size.is_shell(x, y, z) {
                continue;
            }
            let p = Vec3::new(x as f32, y as f32, z as f32);
            if emitter.contains(size, p) {
                let i = size.index(x, y, z);
                density[i] = settings.source_density;
                temperature[i] = settings.source_temperature;
                velocity[i] = [0.0, settings.source_velocity, 0.0];
            }
        }

        Self {
            size,
            density,
            temperature,
            velocity,
        }
    }

    /// Number of emitting cells.
    pub fn active_cells(&self) -> usize {
        self.temperature.iter().filter(|&&t| t > 0.0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(ty: SourceType) -> Settings {
        Settings::default()
            .with_size([1, 2, 1], 4, 16, 16.0)
            .with_source_radius(3.0)
            .with_source_type(ty)
    }

    #[test]
    fn sphere_sits_above_the_floor_in_the_middle() {
        let s = small(SourceType::SingleSphere);
        let f = SourceFields::generate(&s, Resolution::Substance);
        assert_eq!(f.size, GridSize::new(16, 32, 16));

        // radius = 3 / (16 / 16) = 3 cells, centre (8, 4, 8)
        let c = f.size.index(8, 4, 8);
        assert_eq!(f.density[c], s.source_density);
        assert_eq!(f.temperature[c], s.source_temperature);
        assert_eq!(f.density[f.size.index(8, 12, 8)], 0.0);
        assert!(f.active_cells() > 0);
    }

    #[test]
    fn shell_never_emits() {
        for ty in SourceType::ALL {
            let f = SourceFields::generate(&small(ty), Resolution::Substance);
            for (x, y, z) in f.size.cells() {
                if f.size.is_shell(x, y, z) {
                    let i = f.size.index(x, y, z);
                    assert_eq!(f.density[i], 0.0, "{ty:?} emits at ({x},{y},{z})");
                }
            }
            assert!(f.active_cells() > 0, "{ty:?} has no active cells");
        }
    }

    #[test]
    fn floor_fills_the_two_bottom_layers() {
        let f = SourceFields::generate(&small(SourceType::Floor), Resolution::Substance);
        let interior = (f.size.width - 2) * (f.size.depth - 2);
        assert_eq!(f.active_cells(), 2 * interior as usize);
        assert!(f.temperature[f.size.index(5, 1, 5)] > 0.0);
        assert!(f.temperature[f.size.index(5, 2, 5)] > 0.0);
        assert_eq!(f.temperature[f.size.index(5, 3, 5)], 0.0);
    }

    #[test]
    fn dual_spheres_leave_the_centre_empty() {
        let f = SourceFields::generate(&small(SourceType::DualSpheres), Resolution::Substance);
        // centres at x = 8 +- 3.6
        assert_eq!(f.density[f.size.index(8, 4, 8)], 0.0);
        assert!(f.density[f.size.index(12, 4, 8)] > 0.0);
        assert!(f.density[f.size.index(4, 4, 8)] > 0.0);
    }

    #[test]
    fn source_velocity_points_up() {
        let s = small(SourceType::Cube).with_source_velocity(2.5);
        let f = SourceFields::generate(&s, Resolution::Velocity);
        let c = f.size.index(2, 1, 2);
        assert_eq!(f.velocity[c], [0.0, 2.5, 0.0]);
    }
}
