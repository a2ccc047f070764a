use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use lookup_client::{HttpLookupClient, LookupConfig};
use shared::{
    catalog::Catalog,
    domain::{OptionId, SelectOption},
};
use synchronizer::{
    options, CascadingSelect, CollectingSink, ControlRole, MemorySelect, SelectChange,
    SelectControl, SelectorState, SyncConfig, SyncOutcome,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Drives a cascading parent/dependent selector against a lookup server.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[arg(long)]
    server_url: String,
    /// Catalog supplying the parent options, as a server-rendered form would.
    #[arg(long, default_value = "data/catalog.toml")]
    catalog: PathBuf,
    /// Extra candidate path prefix on the same origin (repeatable).
    #[arg(long)]
    path_prefix: Vec<String>,
    /// Extra candidate origin tried after the primary one (repeatable).
    #[arg(long)]
    mirror: Vec<String>,
    /// Parent preselected before mount.
    #[arg(long)]
    parent: Option<String>,
    /// Dependent picked after mount.
    #[arg(long)]
    dependent: Option<String>,
    #[arg(long)]
    reverse_sync: bool,
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long)]
    cache_bust: bool,
    #[arg(long, default_value = options::DEFAULT_PLACEHOLDER)]
    placeholder: String,
}

fn lookup_config(args: &Args) -> Result<LookupConfig> {
    let mut config = LookupConfig::for_origin(&args.server_url)?.with_cache_bust(args.cache_bust);
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

fn print_state(name: &str, state: &SelectorState) {
    let current = match (&state.current, state.current_label()) {
        (Some(id), Some(label)) => format!("{label} ({id})"),
        _ => "(none)".to_string(),
    };
    println!("{name:<9} {current}");
    println!("{:<9} {}", "", state.labels().join(" | "));
}

fn print_outcome(step: &str, outcome: &SyncOutcome) {
    println!("{step:<9} {outcome:?}");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let args = Args::parse();

    let raw = fs::read_to_string(&args.catalog)
        .with_context(|| format!("failed to read catalog '{}'", args.catalog.display()))?;
    let catalog = Catalog::from_toml_str(&raw)?;

    let client = HttpLookupClient::new(lookup_config(&args)?)?;
    let sync_config = SyncConfig {
        reverse_sync: args.reverse_sync,
        placeholder_label: args.placeholder.clone(),
    };
    let primary = MemorySelect::with_options(&sync_config.placeholder_label, &catalog.parent_options());
    let dependent = MemorySelect::default();
    let sink = CollectingSink::default();
    let sync = CascadingSelect::new(
        Arc::new(primary.clone()),
        Arc::new(dependent.clone()),
        Arc::new(client),
        sync_config,
    )
    .with_diagnostics(Arc::new(sink.clone()));

    if let Some(parent) = args.parent.as_deref().and_then(OptionId::parse) {
        if !primary.select(Some(&parent)) {
            bail!("parent '{parent}' is not in catalog '{}'", args.catalog.display());
        }
    }
    print_outcome("mount", &sync.mount().await);

    if let Some(picked) = args.dependent.as_deref().and_then(OptionId::parse) {
        if !dependent.select(Some(&picked)) {
            // Emulates a stale, pre-rendered entry the user could still pick.
            let Some(record) = catalog
                .dependents
                .iter()
                .find(|d| OptionId::from(d.id) == picked)
            else {
                bail!("dependent '{picked}' is not in catalog '{}'", args.catalog.display());
            };
            info!(dependent = %picked, "dependent not listed; rendering it as a pre-rendered entry");
            dependent.replace_entries(options::render(
                &args.placeholder,
                &[SelectOption::new(record.id, record.name.clone())],
            ));
            dependent.select(Some(&picked));
        }
        let outcome = sync.handle(SelectChange::user(ControlRole::Dependent)).await;
        print_outcome("pick", &outcome);
    }

    print_state("parent", &primary.snapshot());
    print_state("dependent", &dependent.snapshot());
    for diagnostic in sink.diagnostics() {
        eprintln!("warning: {}", diagnostic.message());
    }
    Ok(())
}
