//! # Sun Clock Application Entry Point
//!
//! This binary wires the clock core to the terminal: it loads configuration,
//! builds the face controller, and drives it from a tokio event loop. The host
//! side of the face (minute ticks, time-zone changes, shutdown) is simulated
//! with small background tasks feeding the event channel.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use log::{debug, info};
use std::{env, io, path::PathBuf};
use sun_clock_lib::{
    config::{self, Config},
    controller::FaceController,
    renderer::{AsciiRenderer, JsonRenderer, Renderer},
    runtime::{Clock, FaceEvent, FaceLoop, SystemClock},
};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Command line switches.
#[derive(Debug, Default, PartialEq)]
struct Options {
    config_path: Option<PathBuf>,
    json: bool,
    once: bool,
    dim: bool,
    force_24_hour: bool,
}

impl Options {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = args.next().context("--config needs a path")?;
                    options.config_path = Some(PathBuf::from(path));
                }
                "--json" => options.json = true,
                "--once" => options.once = true,
                "--dim" => options.dim = true,
                "--24h" => options.force_24_hour = true,
                other => anyhow::bail!("unknown argument: {other}"),
            }
        }
        Ok(options)
    }
}

fn build_renderer(options: &Options, config: &Config) -> Box<dyn Renderer + Send> {
    if options.json {
        Box::new(JsonRenderer::new(io::stdout()))
    } else {
        Box::new(AsciiRenderer::new(
            io::stdout(),
            config.display.sun_track_width,
        ))
    }
}

/// Emit a `Tick` on every minute boundary, and a time-zone event whenever
/// the host's local offset changes.
async fn minute_ticks(events: mpsc::Sender<FaceEvent>, follow_local_zone: bool) {
    let mut offset = config::local_offset();
    loop {
        let now = SystemClock.now_millis();
        let delay = MILLIS_PER_MINUTE - now.rem_euclid(MILLIS_PER_MINUTE);
        sleep(Duration::from_millis(delay as u64)).await;

        let current = config::local_offset();
        let event = if follow_local_zone && current != offset {
            info!("local utc offset changed from {offset} to {current}");
            offset = current;
            FaceEvent::TimeZoneOrClockChanged(Some(current))
        } else {
            FaceEvent::Tick
        };
        if events.send(event).await.is_err() {
            debug!("face loop gone, minute ticks stopping");
            return;
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let options = Options::parse(env::args().skip(1))?;

    let config = match &options.config_path {
        Some(path) => Config::try_load_from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::load(),
    };
    let location = config.geo_location()?;
    let is_24_hour = options.force_24_hour || config.clock.use_24_hour;

    let mut controller = FaceController::new(
        location,
        config.utc_offset(),
        config.clock.date_format.clone(),
    );
    let mut renderer = build_renderer(&options, &config);

    if options.once {
        if options.dim {
            controller.on_dim_state_changed(true);
        }
        let snapshot = controller.on_tick(SystemClock.now_millis(), is_24_hour);
        renderer.render(&snapshot)?;
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new()?;
    let rendered = rt.block_on(async {
        let (tx, rx) = mpsc::channel(16);

        tx.send(FaceEvent::Resume).await?;
        if options.dim {
            tx.send(FaceEvent::DimChanged(true)).await?;
        }

        let follow_local_zone = config.clock.utc_offset_minutes.is_none();
        tokio::spawn(minute_ticks(tx.clone(), follow_local_zone));

        let shutdown = tx;
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = shutdown.send(FaceEvent::Shutdown).await;
            }
        });

        let mut face = FaceLoop::new(controller, renderer, SystemClock, is_24_hour);
        anyhow::Ok(face.run(rx).await)
    })?;

    info!("rendered {rendered} frames");
    Ok(())
}
