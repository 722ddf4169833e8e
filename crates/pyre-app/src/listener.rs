use std::collections::HashMap;

use pyre_core::{CommandQueue, EngineError, FireCommand};
use pyre_host::{FromContext, InputDelegate, PointerAction, PointerEvent, ScaleEvent};

use crate::FireContext;

/// A pointer that never strays further than this from where it went down is a tap.
pub const TAP_SLOP_PX: f64 = 10.0;

#[derive(Debug, Clone, Copy)]
struct Track {
    start: (f64, f64),
    last: (f64, f64),
    max_offset: f64,
}

/// Turns pointer, scale and orientation events into [`FireCommand`]s.
#[derive(Debug)]
pub struct FireListener {
    commands: CommandQueue,
    pointers: HashMap<u64, Track>,
}

impl FromContext<FireContext> for FireListener {
    fn from_context(ctx: &FireContext) -> Result<Self, EngineError> {
        Ok(Self {
            commands: ctx.commands.clone(),
            pointers: HashMap::new(),
        })
    }
}

impl FireListener {
    /// Pointers currently down.
    pub fn active_pointers(&self) -> usize {
        self.pointers.len()
    }
}

impl InputDelegate for FireListener {
    fn on_pointer(&mut self, ev: &PointerEvent) -> bool {
        match ev.action {
            PointerAction::Down => {
                self.pointers.insert(
                    ev.id,
                    Track {
                        start: (ev.x, ev.y),
                        last: (ev.x, ev.y),
                        max_offset: 0.0,
                    },
                );
                true
            }
            PointerAction::Move => {
                let Some(track) = self.pointers.get_mut(&ev.id) else {
                    return false;
                };
                let (dx, dy) = (ev.x - track.last.0, ev.y - track.last.1);
                track.last = (ev.x, ev.y);
                let offset = (ev.x - track.start.0).hypot(ev.y - track.start.1);
                track.max_offset = track.max_offset.max(offset);
                if dx != 0.0 || dy != 0.0 {
                    self.commands.push(FireCommand::Touch {
                        x: ev.x,
                        y: ev.y,
                        dx,
                        dy,
                    });
                }
                true
            }
            PointerAction::Up => {
                let Some(track) = self.pointers.remove(&ev.id) else {
                    return false;
                };
                let offset = (ev.x - track.start.0).hypot(ev.y - track.start.1);
                if track.max_offset.max(offset) < TAP_SLOP_PX {
                    self.commands.push(FireCommand::Click);
                }
                true
            }
            PointerAction::Cancel => self.pointers.remove(&ev.id).is_some(),
        }
    }

    fn on_scale(&mut self, ev: &ScaleEvent) -> bool {
        self.commands.push(FireCommand::Scale {
            factor: ev.factor,
            x: ev.focus_x,
            y: ev.focus_y,
        });
        true
    }

    fn on_orientation(&mut self, rotation: &[f32; 9]) -> bool {
        self.commands.push(FireCommand::RotationSensor(*rotation));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyre_core::Settings;

    fn listener() -> (FireListener, CommandQueue) {
        let ctx = FireContext::new(Settings::default(), 100, 100);
        (FireListener::from_context(&ctx).unwrap(), ctx.commands)
    }

    fn ev(id: u64, action: PointerAction, x: f64, y: f64) -> PointerEvent {
        PointerEvent { id, action, x, y }
    }

    #[test]
    fn drag_emits_incremental_touches() {
        let (mut l, q) = listener();
        l.on_pointer(&ev(0, PointerAction::Down, 10.0, 10.0));
        l.on_pointer(&ev(0, PointerAction::Move, 30.0, 10.0));
        l.on_pointer(&ev(0, PointerAction::Move, 30.0, 25.0));
        l.on_pointer(&ev(0, PointerAction::Up, 30.0, 25.0));

        assert_eq!(
            q.drain(),
            vec![
                FireCommand::Touch {
                    x: 30.0,
                    y: 10.0,
                    dx: 20.0,
                    dy: 0.0
                },
                FireCommand::Touch {
                    x: 30.0,
                    y: 25.0,
                    dx: 0.0,
                    dy: 15.0
                },
            ]
        );
        assert_eq!(l.active_pointers(), 0);
    }

    #[test]
    fn small_wobble_is_still_a_tap() {
        let (mut l, q) = listener();
        l.on_pointer(&ev(0, PointerAction::Down, 50.0, 50.0));
        l.on_pointer(&ev(0, PointerAction::Move, 53.0, 54.0));
        l.on_pointer(&ev(0, PointerAction::Up, 51.0, 50.0));
        let cmds = q.drain();
        assert_eq!(cmds.last(), Some(&FireCommand::Click));
    }

    #[test]
    fn drag_out_and_back_is_not_a_tap() {
        let (mut l, q) = listener();
        l.on_pointer(&ev(0, PointerAction::Down, 50.0, 50.0));
        l.on_pointer(&ev(0, PointerAction::Move, 80.0, 50.0));
        l.on_pointer(&ev(0, PointerAction::Move, 50.0, 50.0));
        l.on_pointer(&ev(0, PointerAction::Up, 50.0, 50.0));
        assert!(!q.drain().contains(&FireCommand::Click));
    }

    #[test]
    fn pointers_are_tracked_independently() {
        let (mut l, q) = listener();
        l.on_pointer(&ev(1, PointerAction::Down, 0.0, 0.0));
        l.on_pointer(&ev(2, PointerAction::Down, 100.0, 100.0));
        l.on_pointer(&ev(2, PointerAction::Move, 90.0, 100.0));
        assert_eq!(l.active_pointers(), 2);
        assert!(l.on_pointer(&ev(1, PointerAction::Cancel, 0.0, 0.0)));
        assert!(!l.on_pointer(&ev(1, PointerAction::Up, 0.0, 0.0)));
        assert!(!l.on_pointer(&ev(7, PointerAction::Move, 1.0, 1.0)));

        let cmds = q.drain();
        assert_eq!(cmds.len(), 1);
        assert!(matches!(cmds[0], FireCommand::Touch { dx, .. } if dx == -10.0));
    }

    #[test]
    fn scale_and_orientation_are_forwarded() {
        let (mut l, q) = listener();
        assert!(l.on_scale(&ScaleEvent {
            factor: 1.2,
            focus_x: 5.0,
            focus_y: 6.0
        }));
        let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        assert!(l.on_orientation(&m));
        assert_eq!(
            q.drain(),
            vec![
                FireCommand::Scale {
                    factor: 1.2,
                    x: 5.0,
                    y: 6.0
                },
                FireCommand::RotationSensor(m),
            ]
        );
    }
}
