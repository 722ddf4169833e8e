//! Ties the simulator and the renderer together and buffers settings edits.

use glam::{Mat4, Vec3};
use pyre_core::{ChangeEffect, EngineError, FireCommand, PresetCycle, Settings, SettingsChange};
use pyre_sim::{drag_to_grid, screen_to_grid};

use crate::renderer::RayRenderer;
use crate::simulator::Simulator;

/// Settings edits waiting for the next frame.
///
/// Input may arrive at any time but GL objects can only be rebuilt on the render thread,
/// so edits land here and [`Fire::update`] picks them up with [`PendingSettings::take`].
#[derive(Debug, Clone)]
pub struct PendingSettings {
    settings: Settings,
    presets: PresetCycle,
    pending_update: bool,
    pending_regen: bool,
}

impl PendingSettings {
    pub fn new(settings: Settings) -> Self {
        let mut presets = PresetCycle::new();
        // The first preset is the default one; a click should move past it.
        presets.next_settings();
        Self {
            settings,
            presets,
            pending_update: false,
            pending_regen: false,
        }
    }

    /// The latest settings, including edits not yet taken.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_pending(&self) -> bool {
        self.pending_update
    }

    pub fn apply_change(&mut self, change: &SettingsChange) -> Result<ChangeEffect, EngineError> {
        let effect = change.apply(&mut self.settings)?;
        self.pending_update = true;
        self.pending_regen |= effect.regen_fields;
        Ok(effect)
    }

    /// Adopt the solver tuning of the next built-in preset and return its name. Every other
    /// field keeps its current value.
    pub fn on_click(&mut self) -> String {
        let preset = self.presets.next_settings();
        self.settings.projection_iterations = preset.projection_iterations;
        self.settings.vorticity_scale = preset.vorticity_scale;
        self.pending_update = true;
        preset.name
    }

    /// Settings to adopt and whether fields must be rebuilt, once per batch of edits.
    pub fn take(&mut self) -> Option<(Settings, bool)> {
        if !self.pending_update {
            return None;
        }
        let regen = self.pending_regen;
        self.pending_update = false;
        self.pending_regen = false;
        Some((self.settings.clone(), regen))
    }
}

/// A pointer drag in window pixels.
#[derive(Debug, Clone, Copy)]
struct Drag {
    x: f64,
    y: f64,
    dx: f64,
    dy: f64,
    width: u32,
    height: u32,
}

/// Grid position and direction of the force a drag applies; `None` in touch mode.
fn drag_force(touch_mode: bool, inv_mvp: Mat4, drag: Drag) -> Option<(Vec3, Vec3)> {
    if touch_mode {
        return None;
    }
    let Drag {
        x,
        y,
        dx,
        dy,
        width,
        height,
    } = drag;
    Some((
        screen_to_grid(inv_mvp, x, y, width, height),
        drag_to_grid(inv_mvp, dx, dy, width, height),
    ))
}

#[derive(Debug)]
pub struct Fire {
    pending: PendingSettings,
    renderer: RayRenderer,
    simulator: Simulator,
    width: u32,
    height: u32,
}

impl Fire {
    pub unsafe fn new(
        gl: &glow::Context,
        settings: Settings,
        width: u32,
        height: u32,
    ) -> Result<Self, EngineError> {
        let simulator = Simulator::init(gl, &settings)?;
        let mut renderer = RayRenderer::new(gl, &settings)?;
        renderer.resize(width, height);
        tracing::info!(name = %settings.name, width, height, "fire initialised");
        Ok(Self {
            pending: PendingSettings::new(settings),
            renderer,
            simulator,
            width: width.max(1),
            height: height.max(1),
        })
    }

    pub fn settings(&self) -> &Settings {
        self.pending.settings()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.renderer.resize(width, height);
    }

    /// Apply pending settings, step the simulation and draw it.
    pub unsafe fn update(&mut self, gl: &glow::Context) -> Result<(), EngineError> {
        if let Some((settings, regen)) = self.pending.take() {
            self.simulator.change_settings(gl, &settings, regen)?;
            self.renderer.change_settings(&settings);
        }
        let (density, temperature, size) = self.simulator.update(gl)?;
        self.renderer.draw(gl, density, temperature, size);
        Ok(())
    }

    /// Drag at (`x`, `y`) by (`dx`, `dy`) pixels. The camera always orbits; outside touch
    /// mode the drag also pushes the fire.
    pub fn touch(&mut self, x: f64, y: f64, dx: f64, dy: f64) {
        self.renderer.touch(dx as f32, dy as f32);
        let drag = Drag {
            x,
            y,
            dx,
            dy,
            width: self.width,
            height: self.height,
        };
        let touch_mode = self.pending.settings().touch_mode;
        let force = drag_force(touch_mode, self.renderer.inverse_mvp(), drag);
        if let Some((position, direction)) = force {
            self.simulator.add_external_force(position, direction);
        }
    }

    pub fn scale(&mut self, factor: f32, x: f64, y: f64) {
        self.renderer.scale(factor, x, y);
    }

    pub fn on_click(&mut self) {
        let name = self.pending.on_click();
        tracing::info!(preset = %name, "switching preset tuning");
    }

    pub fn rotation_sensor(&mut self, rotation: [f32; 9]) {
        self.simulator.update_device_rotation(rotation);
    }

    pub fn apply_change(&mut self, change: &SettingsChange) -> Result<ChangeEffect, EngineError> {
        self.pending.apply_change(change)
    }

    /// Whether edits are waiting for the next [`Fire::update`].
    pub fn changed_settings(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn handle(&mut self, command: FireCommand) -> Result<(), EngineError> {
        match command {
            FireCommand::Touch { x, y, dx, dy } => self.touch(x, y, dx, dy),
            FireCommand::Scale { factor, x, y } => self.scale(factor, x, y),
            FireCommand::Click => self.on_click(),
            FireCommand::RotationSensor(m) => self.rotation_sensor(m),
            FireCommand::Change(change) => {
                self.apply_change(&change)?;
            }
        }
        Ok(())
    }

    pub unsafe fn destroy(&mut self, gl: &glow::Context) {
        self.simulator.destroy(gl);
        self.renderer.destroy(gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyre_core::SourceType;

    #[test]
    fn nothing_pending_initially() {
        let mut p = PendingSettings::new(Settings::default());
        assert!(!p.is_pending());
        assert!(p.take().is_none());
    }

    #[test]
    fn edits_batch_until_taken() {
        let mut p = PendingSettings::new(Settings::default());
        p.apply_change(&SettingsChange::Vorticity(3.0)).unwrap();
        p.apply_change(&SettingsChange::ObjectType(SourceType::Cube))
            .unwrap();
        p.apply_change(&SettingsChange::Buoyancy(0.5)).unwrap();

        let (s, regen) = p.take().unwrap();
        assert!(regen);
        assert_eq!(s.vorticity_scale, 3.0);
        assert_eq!(s.source_type, SourceType::Cube);
        assert_eq!(s.buoyancy_scale, 0.5);
        assert!(p.take().is_none());

        p.apply_change(&SettingsChange::WindStrength(1.0)).unwrap();
        let (_, regen) = p.take().unwrap();
        assert!(!regen);
    }

    #[test]
    fn rejected_edit_is_not_pending() {
        let mut p = PendingSettings::new(Settings::default());
        assert!(p.apply_change(&SettingsChange::TimeStep(-1.0)).is_err());
        assert!(!p.is_pending());
        assert!(p.take().is_none());
    }

    #[test]
    fn clicks_walk_the_preset_tuning() {
        let mut p = PendingSettings::new(Settings::default());
        assert_eq!(p.on_click(), "Few Iterations");
        assert_eq!(p.settings().projection_iterations, 10);
        assert_eq!(p.on_click(), "Example");
        assert_eq!(p.settings().projection_iterations, 34);
        assert_eq!(p.settings().vorticity_scale, 6.0);
        assert_eq!(p.on_click(), "Default");

        let (s, regen) = p.take().unwrap();
        assert!(!regen);
        assert_eq!(s.projection_iterations, 20);
        assert_eq!(s.vorticity_scale, 8.0);
    }

    #[test]
    fn click_keeps_user_settings() {
        let loaded = Settings::default()
            .with_name("Mine")
            .with_source_radius(3.0);
        let mut p = PendingSettings::new(loaded);
        p.apply_change(&SettingsChange::TouchMode(true)).unwrap();
        p.take();

        p.on_click();
        let (s, _) = p.take().unwrap();
        assert_eq!(s.name, "Mine");
        assert!(s.touch_mode);
        assert_eq!(s.source_radius, 3.0);
        assert_eq!(s.projection_iterations, 10);
    }

    fn view() -> Mat4 {
        let settings = Settings::default();
        let camera = pyre_sim::OrbitCamera::default();
        let model = pyre_sim::VolumeTransform::from_settings(&settings).model();
        camera.mvp(model, 1.0).inverse()
    }

    const CENTRE_DRAG: Drag = Drag {
        x: 50.0,
        y: 50.0,
        dx: 10.0,
        dy: 0.0,
        width: 100,
        height: 100,
    };

    #[test]
    fn drag_pushes_only_outside_touch_mode() {
        assert_eq!(drag_force(true, view(), CENTRE_DRAG), None);

        let (position, direction) = drag_force(false, view(), CENTRE_DRAG).unwrap();
        assert!((position - Vec3::splat(0.5)).length() < 1e-3);
        assert!(direction.length() > 0.0);
        assert!(direction.x.abs() > direction.y.abs());
    }
}
