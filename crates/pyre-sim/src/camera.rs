use glam::{Mat4, Vec3};
use pyre_core::Settings;

/// Radians of orbit per dragged pixel.
pub const ORBIT_SPEED: f32 = 0.005;
pub const PITCH_LIMIT: f32 = 1.4;
pub const MIN_DISTANCE: f32 = 0.8;
pub const MAX_DISTANCE: f32 = 6.0;

/// Camera orbiting the origin, where the volume is centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub fov_y: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.2,
            distance: 2.0,
            fov_y: 45f32.to_radians(),
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        self.distance
            * Vec3::new(
                self.pitch.cos() * self.yaw.sin(),
                self.pitch.sin(),
                self.pitch.cos() * self.yaw.cos(),
            )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, aspect.max(1e-3), 0.05, 20.0)
    }

    pub fn mvp(&self, model: Mat4, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view() * model
    }

    /// Orbit by a pointer drag of (`dx`, `dy`) pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ORBIT_SPEED;
        self.pitch = (self.pitch + dy * ORBIT_SPEED).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Zoom by `factor` (> 1 moves closer). Non-positive factors are ignored.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance / factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
    }
}

/// Places the unit grid cube in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeTransform {
    /// Box extent in world units; the longest side is 1.
    pub bounding_scale: Vec3,
}

impl VolumeTransform {
    pub fn from_settings(settings: &Settings) -> Self {
        let size = Vec3::from_array(settings.simulation_size());
        Self {
            bounding_scale: size / size.max_element(),
        }
    }

    /// Maps `[0, 1]^3` to a box centred at the origin.
    pub fn model(&self) -> Mat4 {
        Mat4::from_scale(self.bounding_scale) * Mat4::from_translation(Vec3::splat(-0.5))
    }
}
