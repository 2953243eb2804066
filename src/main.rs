mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use app::NameTrendsApp;
use clap::Parser;
use eframe::egui;
use name_trends::config::Config;
use state::AppState;

/// Explore French first-name birth statistics.
#[derive(Parser)]
#[command(name = "name-trends")]
struct Cli {
    /// Dataset to open at start-up (overrides `data.path` from the config).
    file: Option<PathBuf>,

    /// Configuration file (default: ~/.config/name-trends/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let load_options = config.data.load_options()?;

    let mut state = AppState::new(&config, load_options);
    if let Some(path) = cli.file.or_else(|| config.data.path.clone()) {
        state.open(&path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Name Trends – French first names",
        options,
        Box::new(|_cc| Ok(Box::new(NameTrendsApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running viewer: {e}"))
}
