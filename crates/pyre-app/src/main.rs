use anyhow::Context;
use pyre_app::cli::{parse_args, CliAction, USAGE};
use pyre_app::{osc, FireContext, FireView};
use pyre_control_osc::OscParamReceiver;
use pyre_core::Settings;
use pyre_host_winit::WinitSurface;
use tracing_subscriber::EnvFilter;

fn print_usage_and_exit() -> ! {
    eprintln!("{USAGE}");
    std::process::exit(2);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = match parse_args(std::env::args().skip(1)) {
        Ok(CliAction::Run(cfg)) => cfg,
        Ok(CliAction::Help) => print_usage_and_exit(),
        Err(msg) => {
            eprintln!("{msg}");
            print_usage_and_exit();
        }
    };

    let settings = match &cfg.settings_path {
        Some(path) => Settings::from_json_path(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    tracing::info!(name = %settings.name, "settings loaded");

    let ctx = FireContext::new(settings, cfg.width, cfg.height);

    if let Some(addr) = &cfg.osc_addr {
        let receiver = OscParamReceiver::bind(addr)?;
        tracing::info!(%addr, "OSC listening");
        osc::spawn_forwarder(receiver, ctx.commands.clone()).context("starting the OSC thread")?;
    }

    let surface = WinitSurface::new("fireview", cfg.width, cfg.height);
    let view = FireView::new(surface, &ctx).context("initialising the fire view")?;
    view.into_platform().run()?;
    Ok(())
}
