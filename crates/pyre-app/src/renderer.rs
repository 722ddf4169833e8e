use pyre_core::{CommandQueue, EngineError, Settings};
use pyre_host::{FromContext, RenderDelegate};
use pyre_runtime_glow::Fire;

use crate::FireContext;

/// Runs the fire on the render thread.
#[derive(Debug)]
pub struct FireRenderer {
    settings: Settings,
    commands: CommandQueue,
    fire: Option<Fire>,
    width: u32,
    height: u32,
}

impl FromContext<FireContext> for FireRenderer {
    fn from_context(ctx: &FireContext) -> Result<Self, EngineError> {
        ctx.settings.validate()?;
        Ok(Self {
            settings: ctx.settings.clone(),
            commands: ctx.commands.clone(),
            fire: None,
            width: ctx.width.max(1),
            height: ctx.height.max(1),
        })
    }
}

impl FireRenderer {
    pub fn is_initialised(&self) -> bool {
        self.fire.is_some()
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Current settings, including edits the fire has not applied yet.
    pub fn settings(&self) -> &Settings {
        self.fire
            .as_ref()
            .map(Fire::settings)
            .unwrap_or(&self.settings)
    }
}

impl RenderDelegate<glow::Context> for FireRenderer {
    fn on_surface_created(&mut self, gl: &glow::Context) -> Result<(), EngineError> {
        if let Some(mut old) = self.fire.take() {
            self.settings = old.settings().clone();
            unsafe { old.destroy(gl) };
        }
        let fire = unsafe { Fire::new(gl, self.settings.clone(), self.width, self.height)? };
        self.fire = Some(fire);
        Ok(())
    }

    fn on_surface_changed(
        &mut self,
        _gl: &glow::Context,
        width: u32,
        height: u32,
    ) -> Result<(), EngineError> {
        self.width = width.max(1);
        self.height = height.max(1);
        if let Some(fire) = self.fire.as_mut() {
            fire.resize(self.width, self.height);
        }
        tracing::debug!(width, height, "surface changed");
        Ok(())
    }

    fn on_draw_frame(&mut self, gl: &glow::Context) -> Result<(), EngineError> {
        let fire = self
            .fire
            .as_mut()
            .ok_or_else(|| EngineError::surface("draw before surface creation"))?;

        for command in self.commands.drain() {
            if let Err(e) = fire.handle(command) {
                tracing::warn!(error = %e, ?command, "ignoring command");
            }
        }
        if fire.changed_settings() {
            tracing::debug!(name = %fire.settings().name, "applying settings edits");
        }
        unsafe { fire.update(gl) }
    }
}
