use std::{fs, path::PathBuf, sync::Arc, time::Duration};

mod backend_bridge;
mod controller;
mod ui;

use anyhow::{anyhow, Context, Result};
use backend_bridge::{commands::BackendCommand, runtime};
use clap::Parser;
use controller::events::UiEvent;
use crossbeam_channel::bounded;
use eframe::egui;
use lookup_client::{HttpLookupClient, LookupConfig};
use shared::catalog::Catalog;
use synchronizer::{options, CascadingSelect, MemorySelect, SyncConfig, TracingSink};
use tracing_subscriber::EnvFilter;
use ui::CascadeApp;

/// Desktop front end for the city/township cascade.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server_url: String,
    /// Catalog supplying the city options.
    #[arg(long, default_value = "data/catalog.toml")]
    catalog: PathBuf,
    #[arg(long)]
    path_prefix: Vec<String>,
    #[arg(long)]
    mirror: Vec<String>,
    #[arg(long)]
    reverse_sync: bool,
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn lookup_config(args: &Args) -> Result<LookupConfig> {
    let mut config = LookupConfig::for_origin(&args.server_url)?;
    for prefix in &args.path_prefix {
        config = config.with_path_prefix(prefix)?;
    }
    for mirror in &args.mirror {
        config = config.with_mirror(mirror)?;
    }
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.catalog)
        .with_context(|| format!("failed to read catalog '{}'", args.catalog.display()))?;
    let catalog = Catalog::from_toml_str(&raw)?;

    let sync_config = SyncConfig {
        reverse_sync: args.reverse_sync,
        ..SyncConfig::default()
    };
    let primary = MemorySelect::with_options(options::DEFAULT_PLACEHOLDER, &catalog.parent_options());
    let dependent = MemorySelect::default();
    let client = HttpLookupClient::new(lookup_config(&args)?)?;
    let sync = CascadingSelect::new(
        Arc::new(primary.clone()),
        Arc::new(dependent.clone()),
        Arc::new(client),
        sync_config,
    )
    .with_diagnostics(Arc::new(TracingSink));

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);
    runtime::launch(cmd_rx, ui_tx, Arc::new(sync));

    let mut app = CascadeApp::new(primary, dependent, cmd_tx, ui_rx);
    app.dispatch(BackendCommand::Mount);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Cascading Select")
            .with_inner_size([480.0, 220.0])
            .with_min_inner_size([360.0, 180.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Cascading Select",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|err| anyhow!("desktop gui exited with error: {err}"))
}
