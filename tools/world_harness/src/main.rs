use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use world_core::{
    build_app_with_store, load_world_config_from_env, run_turn, LastTurnReport,
    PendingWorldChanges, WorldConfig, WorldConfigMetadata, WorldStateStore,
};
use world_proto::{decode_changes_json, decode_save_json, encode_save_json};

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay world changes and advance turns headlessly", long_about = None)]
struct Args {
    /// World config JSON (defaults to WORLD_CONFIG_PATH or the builtin table)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save file to start from instead of a freshly seeded world
    #[arg(long)]
    save: Option<PathBuf>,

    /// JSON array of changes queued before the first turn
    #[arg(long)]
    changes: Option<PathBuf>,

    /// Number of turns to run
    #[arg(long, default_value_t = 1)]
    turns: u32,

    /// Write the resulting save here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the world summary after the run
    #[arg(long)]
    summary: bool,

    /// Print the per-turn reports
    #[arg(long)]
    reports: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let (config, metadata) = match &args.config {
        Some(path) => {
            let config = WorldConfig::from_file(path)
                .with_context(|| format!("Failed to load world config at {}", path.display()))?;
            (Arc::new(config), WorldConfigMetadata::new(Some(path.clone())))
        }
        None => load_world_config_from_env(),
    };

    let mut store = WorldStateStore::new(Arc::clone(&config));
    if let Some(path) = &args.save {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read save at {}", path.display()))?;
        let save = decode_save_json(&data)
            .with_context(|| format!("Failed to decode save at {}", path.display()))?;
        let report = store.import_state(save);
        tracing::info!(
            target: "world_harness",
            changes = report.changes,
            ongoing_effects = report.ongoing_effects,
            hash = ?report.hash,
            "save.loaded"
        );
    }

    let mut app = build_app_with_store(store, config);
    app.insert_resource(metadata);

    if let Some(path) = &args.changes {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read changes at {}", path.display()))?;
        let changes = decode_changes_json(&data)
            .with_context(|| format!("Failed to parse changes at {}", path.display()))?;
        tracing::info!(target: "world_harness", queued = changes.len(), "changes.queued");
        app.world
            .resource_mut::<PendingWorldChanges>()
            .extend(changes);
    }

    for _ in 0..args.turns {
        run_turn(&mut app);
        if args.reports {
            let report = &app.world.resource::<LastTurnReport>().0;
            println!("=== turn {} ===", report.turn);
            println!("{}", serde_json::to_string_pretty(report)?);
        }
    }

    let store = app.world.resource::<WorldStateStore>();
    if args.summary {
        println!("=== summary ===");
        println!("{}", serde_json::to_string_pretty(&store.get_world_summary())?);
        println!("=== active effects ===");
        println!(
            "{}",
            serde_json::to_string_pretty(&store.get_active_effects_summary())?
        );
    }

    if let Some(path) = &args.output {
        let json = encode_save_json(&store.export_state()).context("Failed to encode save")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write save to {}", path.display()))?;
        tracing::info!(target: "world_harness", path = %path.display(), "save.written");
    }

    Ok(())
}
