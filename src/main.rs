// src/main.rs
#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use pose_cam_duo::{config::Config, pipeline::Action};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Start with this image loaded
    #[arg(short, long, conflicts_with = "video")]
    image: Option<PathBuf>,

    /// Start with this video playing
    #[arg(short, long)]
    video: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
    info!("Starting POSE_CAM_DUO");

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };

    let initial = match (args.image, args.video) {
        (Some(path), _) => Some(Action::SelectImage(path)),
        (None, Some(path)) => Some(Action::SelectVideo(path)),
        (None, None) => None,
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.display.width as f32 + 40.0, config.display.height as f32 + 160.0])
            .with_min_inner_size([300.0, 200.0]),
        ..Default::default()
    };

    eframe::run_native(
        "POSE_CAM_DUO",
        native_options,
        Box::new(move |cc| Ok(Box::new(ui::PoseViewerUI::new(cc, config, initial)?))),
    )
    .map_err(|e| anyhow::anyhow!("UI failed: {}", e))
}
