//! pyre-control-osc
//!
//! OSC control plane for the fire: receives parameter messages over UDP and maps them to
//! [`SettingsChange`](pyre_core::SettingsChange)s.
//!
//! rosc 0.10.x API note:
//! - `rosc::decoder::decode_udp` returns `Result<(&[u8], OscPacket), _>` (nom-style),
//!   where the first tuple element is the *unconsumed remainder* of the buffer.

pub mod params;

use std::io;
use std::net::{SocketAddr, UdpSocket};

use rosc::{OscPacket, OscType};
use thiserror::Error;

pub use params::{settings_change_for, PARAM_NAMES};

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("bind OSC {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("unknown parameter `{0}`")]
    UnknownParam(String),

    #[error("parameter `{name}` expects {expected}, got {got:?}")]
    BadValue {
        name: String,
        expected: &'static str,
        got: ParamValue,
    },
}

/// Value carried by a parameter message.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Number(f32),
    /// Three numeric arguments (colours, colour space).
    Triple([f32; 3]),
    Flag(bool),
    Text(String),
}

/// Non-blocking UDP OSC receiver that extracts parameter messages.
///
/// Convention:
/// - Address: "/param/<name>" or "/<name>"
/// - Value: one number, three numbers, a boolean or a string
#[derive(Debug)]
pub struct OscParamReceiver {
    sock: UdpSocket,
    buf: [u8; 2048],
}

impl OscParamReceiver {
    /// Bind to an address like "127.0.0.1:9000" and put the socket in non-blocking mode.
    pub fn bind(addr: &str) -> Result<Self, ControlError> {
        let bind_err = |source| ControlError::Bind {
            addr: addr.to_string(),
            source,
        };
        let sock = UdpSocket::bind(addr).map_err(bind_err)?;
        sock.set_nonblocking(true).map_err(bind_err)?;
        Ok(Self {
            sock,
            buf: [0u8; 2048],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.sock.local_addr()
    }

    /// Drain every parameter update available right now. Never blocks.
    pub fn poll(&mut self) -> Vec<(String, ParamValue)> {
        let mut out = Vec::new();

        loop {
            match self.sock.recv_from(&mut self.buf) {
                Ok((n, from)) => match rosc::decoder::decode_udp(&self.buf[..n]) {
                    Ok((_rest, pkt)) => extract_from_packet(pkt, &mut out),
                    Err(e) => tracing::debug!(%from, error = ?e, "dropping malformed OSC packet"),
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::warn!(error = %e, "OSC socket error");
                    break;
                }
            }
        }

        out
    }
}

/// Walk a packet/bundle tree and push parsed param messages into `out`.
fn extract_from_packet(pkt: OscPacket, out: &mut Vec<(String, ParamValue)>) {
    match pkt {
        OscPacket::Message(m) => {
            if let Some(kv) = parse_param_message(&m.addr, &m.args) {
                out.push(kv);
            }
        }
        OscPacket::Bundle(b) => {
            for p in b.content {
                extract_from_packet(p, out);
            }
        }
    }
}

fn number(arg: &OscType) -> Option<f32> {
    match *arg {
        OscType::Float(x) => Some(x),
        OscType::Double(x) => Some(x as f32),
        OscType::Int(x) => Some(x as f32),
        OscType::Long(x) => Some(x as f32),
        _ => None,
    }
}

/// Parse a message into a `(name, value)` pair if it matches our convention.
fn parse_param_message(addr: &str, args: &[OscType]) -> Option<(String, ParamValue)> {
    let name = addr
        .strip_prefix("/param/")
        .or_else(|| addr.strip_prefix('/'))?;
    if name.is_empty() {
        return None;
    }

    let value = match args {
        [a, b, c] => ParamValue::Triple([number(a)?, number(b)?, number(c)?]),
        [OscType::Bool(v)] => ParamValue::Flag(*v),
        [OscType::String(s)] => ParamValue::Text(s.clone()),
        [v] => ParamValue::Number(number(v)?),
        _ => return None,
    };
    Some((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosc::{OscBundle, OscMessage, OscTime};

    #[test]
    fn addresses_with_and_without_prefix() {
        let args = [OscType::Float(0.5)];
        assert_eq!(
            parse_param_message("/param/vorticity", &args),
            Some(("vorticity".into(), ParamValue::Number(0.5)))
        );
        assert_eq!(
            parse_param_message("/buoyancy", &[OscType::Int(2)]),
            Some(("buoyancy".into(), ParamValue::Number(2.0)))
        );
        assert_eq!(parse_param_message("vorticity", &args), None);
        assert_eq!(parse_param_message("/param/", &args), None);
    }

    #[test]
    fn value_shapes() {
        let rgb = [OscType::Float(0.1), OscType::Double(0.2), OscType::Int(1)];
        assert_eq!(
            parse_param_message("/background_color", &rgb).map(|kv| kv.1),
            Some(ParamValue::Triple([0.1, 0.2, 1.0]))
        );
        assert_eq!(
            parse_param_message("/touch_mode", &[OscType::Bool(true)]).map(|kv| kv.1),
            Some(ParamValue::Flag(true))
        );
        assert_eq!(
            parse_param_message("/object_type", &[OscType::String("CUBE".into())]).map(|kv| kv.1),
            Some(ParamValue::Text("CUBE".into()))
        );
        assert_eq!(parse_param_message("/x", &[]), None);
        assert_eq!(
            parse_param_message("/x", &[OscType::Float(1.0), OscType::Float(2.0)]),
            None
        );
    }

    #[test]
    fn bundles_are_flattened() {
        let msg = |addr: &str, v: f32| {
            OscPacket::Message(OscMessage {
                addr: addr.to_string(),
                args: vec![OscType::Float(v)],
            })
        };
        let bundle = OscPacket::Bundle(OscBundle {
            timetag: OscTime {
                seconds: 0,
                fractional: 1,
            },
            content: vec![msg("/a", 1.0), msg("/param/b", 2.0)],
        });
        let mut out = Vec::new();
        extract_from_packet(bundle, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].0, "b");
    }

    #[test]
    fn receives_over_udp() {
        let mut rx = OscParamReceiver::bind("127.0.0.1:0").unwrap();
        let addr = rx.local_addr().unwrap();

        let pkt = OscPacket::Message(OscMessage {
            addr: "/param/wind_strength".to_string(),
            args: vec![OscType::Float(3.0)],
        });
        let bytes = rosc::encoder::encode(&pkt).unwrap();
        let tx = UdpSocket::bind("127.0.0.1:0").unwrap();
        tx.send_to(&bytes, addr).unwrap();

        let mut got = Vec::new();
        for _ in 0..100 {
            got.extend(rx.poll());
            if !got.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(got, vec![("wind_strength".into(), ParamValue::Number(3.0))]);
    }

    #[test]
    fn bind_errors_name_the_address() {
        let err = OscParamReceiver::bind("not an address").unwrap_err();
        assert!(err.to_string().contains("not an address"));
    }
}
