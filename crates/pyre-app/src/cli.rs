use std::path::PathBuf;

pub const DEFAULT_WIDTH: u32 = 540;
pub const DEFAULT_HEIGHT: u32 = 960;

pub const USAGE: &str = "Usage:\n  fireview [--settings PATH] [--osc ADDR] [--width N] [--height N]\n\nOptions:\n  --settings PATH  JSON settings file (default: built-in defaults)\n  --osc ADDR       UDP bind address for OSC control, e.g. 127.0.0.1:9000\n  --width N        initial window width in pixels (default: 540)\n  --height N       initial window height in pixels (default: 960)\n  --help, -h       Show this help and exit\n\nControls:\n  drag             push the fire (or orbit the camera in touch mode)\n  wheel            zoom\n  click            next preset\n  Esc              quit\n\nOSC message convention:\n  /param/<name> <value>   or   /<name> <value>\n  e.g. /param/vorticity 4.0, /param/object_type CUBE, /param/filter_color 1 0.8 0.6\n";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub settings_path: Option<PathBuf>,
    /// UDP bind address for OSC; `None` disables OSC.
    pub osc_addr: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_path: None,
            osc_addr: None,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    Run(AppConfig),
    Help,
}

fn size_arg(flag: &str, value: Option<String>) -> Result<u32, String> {
    let v = value.ok_or_else(|| format!("{flag} needs a value"))?;
    match v.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{flag} expects a positive integer, got `{v}`")),
    }
}

/// Parse arguments (without the program name).
pub fn parse_args<I>(args: I) -> Result<CliAction, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut cfg = AppConfig::default();

    while let Some(a) = args.next() {
        match a.as_str() {
            "--settings" => {
                let path = args.next().ok_or("--settings needs a path")?;
                cfg.settings_path = Some(PathBuf::from(path));
            }
            "--osc" => cfg.osc_addr = Some(args.next().ok_or("--osc needs an address")?),
            "--width" => cfg.width = size_arg("--width", args.next())?,
            "--height" => cfg.height = size_arg("--height", args.next())?,
            "--help" | "-h" => return Ok(CliAction::Help),
            _ => return Err(format!("Unknown arg: {a}")),
        }
    }

    Ok(CliAction::Run(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliAction, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn defaults_without_arguments() {
        assert_eq!(parse(&[]), Ok(CliAction::Run(AppConfig::default())));
    }

    #[test]
    fn all_options() {
        let action = parse(&[
            "--settings",
            "fire.json",
            "--osc",
            "127.0.0.1:9000",
            "--width",
            "800",
            "--height",
            "600",
        ])
        .unwrap();
        assert_eq!(
            action,
            CliAction::Run(AppConfig {
                settings_path: Some(PathBuf::from("fire.json")),
                osc_addr: Some("127.0.0.1:9000".into()),
                width: 800,
                height: 600,
            })
        );
    }

    #[test]
    fn help_and_errors() {
        assert_eq!(parse(&["--width", "10", "-h"]), Ok(CliAction::Help));
        assert!(parse(&["--width", "0"]).is_err());
        assert!(parse(&["--height", "tall"]).is_err());
        assert!(parse(&["--osc"]).is_err());
        assert_eq!(parse(&["--fast"]), Err("Unknown arg: --fast".into()));
    }
}
