mod app;
mod config;
mod engine;
mod feed;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// WebSocket endpoint streaming transaction events.
    #[arg(long, default_value = "ws://127.0.0.1:9000/api/txs")]
    feed_url: String,
    /// Optional JSON file overriding engine tunables.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 3.0)]
    reconnect_delay_secs: f64,
    /// Frame gaps longer than this count as the window having been hidden.
    #[arg(long, default_value_t = 1.0)]
    hidden_gap_secs: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = config::load_config(args.config.as_deref())?;
    info!(feed_url = %args.feed_url, "starting viewer");

    let app_options = app::AppOptions {
        feed_url: args.feed_url,
        reconnect_delay: Duration::from_secs_f64(args.reconnect_delay_secs.max(0.1)),
        hidden_gap_secs: args.hidden_gap_secs.max(0.1),
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "tangle-viz",
        options,
        Box::new(move |cc| Ok(Box::new(app::TangleApp::new(cc, config, app_options)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
