mod app;
mod config;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// JSON file holding the contact records.
    records: PathBuf,
    /// JSON file overriding simulation, interaction and viewport defaults.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 0)]
    min_strength: u8,
    /// Only show these categories; repeat for several.
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Do not add the supplementary catalogue links.
    #[arg(long)]
    no_enrichment: bool,
    /// JSON file replacing the built-in supplementary link catalogue.
    #[arg(long, conflicts_with = "no_enrichment")]
    catalogue: Option<PathBuf>,
    /// Keep node positions for contacts that survive a filter change.
    #[arg(long)]
    retain_positions: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = config::Settings::from_args(Args::parse())?;
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };

    eframe::run_native(
        "contact-graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::ContactGraphApp::new(cc, settings)))),
    )
    .map_err(|error| anyhow!("graph window failed: {error}"))
}
