use std::f32::consts::TAU;

use glam::Vec3;
use pyre_core::Settings;

/// Angular speed of the rotating wind in radians per second.
pub const WIND_SPIN: f32 = 0.5;

/// Horizontal wind whose angle either spins or follows the configured angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wind {
    pub angle: f32,
}

impl Wind {
    pub fn new(settings: &Settings) -> Self {
        Self {
            angle: settings.wind_angle,
        }
    }

    pub fn advance(&mut self, settings: &Settings, dt: f32) {
        if settings.rotating_wind_angle {
            self.angle = (self.angle + WIND_SPIN * dt).rem_euclid(TAU);
        } else {
            self.angle = settings.wind_angle;
        }
    }

    pub fn direction(&self) -> Vec3 {
        Vec3::new(self.angle.cos(), 0.0, self.angle.sin())
    }

    /// Velocity added per second of simulation.
    pub fn force(&self, settings: &Settings) -> Vec3 {
        self.direction() * settings.wind_strength
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotating_wind_spins_and_wraps() {
        let s = Settings::default().with_wind_angle(6.2);
        let mut w = Wind::new(&s);
        w.advance(&s, 1.0);
        assert!((w.angle - (6.7 - TAU)).abs() < 1e-4);
    }

    #[test]
    fn fixed_wind_follows_settings() {
        let s = Settings::default()
            .with_rotating_wind_angle(false)
            .with_wind_angle(0.0)
            .with_wind_strength(2.0);
        let mut w = Wind { angle: 1.0 };
        w.advance(&s, 10.0);
        assert_eq!(w.angle, 0.0);
        assert!((w.force(&s) - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }
}
