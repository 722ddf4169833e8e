//! Feeds OSC parameter messages into the command queue from a background thread.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pyre_control_osc::{settings_change_for, OscParamReceiver, ParamValue};
use pyre_core::{CommandQueue, FireCommand};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Queue a settings change for every recognised update; returns how many were queued.
pub fn forward(updates: Vec<(String, ParamValue)>, queue: &CommandQueue) -> usize {
    let mut queued = 0;
    for (name, value) in updates {
        match settings_change_for(&name, &value) {
            Ok(change) => {
                tracing::debug!(%name, ?value, "osc parameter");
                queue.push(FireCommand::Change(change));
                queued += 1;
            }
            Err(e) => tracing::warn!(error = %e, "ignoring OSC message"),
        }
    }
    queued
}

/// Poll `receiver` forever, forwarding into `queue`.
pub fn spawn_forwarder(
    mut receiver: OscParamReceiver,
    queue: CommandQueue,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("osc".into()).spawn(move || loop {
        forward(receiver.poll(), &queue);
        thread::sleep(POLL_INTERVAL);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyre_core::SettingsChange;

    #[test]
    fn forwards_known_parameters_only() {
        let q = CommandQueue::new();
        let n = forward(
            vec![
                ("vorticity".into(), ParamValue::Number(2.0)),
                ("nonsense".into(), ParamValue::Number(1.0)),
                ("touch_mode".into(), ParamValue::Flag(true)),
                ("filter_color".into(), ParamValue::Number(1.0)),
            ],
            &q,
        );
        assert_eq!(n, 2);
        assert_eq!(
            q.drain(),
            vec![
                FireCommand::Change(SettingsChange::Vorticity(2.0)),
                FireCommand::Change(SettingsChange::TouchMode(true)),
            ]
        );
    }
}
