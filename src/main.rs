// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::Context;
use std::env;
use std::sync::Arc;

use entity_sync::backends::memory::{Fixture, RecordingStatusStore};
use entity_sync::config::{
    consts::DEFAULT_LOG_LEVEL, load_and_validate_config, Collaborators, SyncPipeline,
};
use entity_sync::observability::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <config.yaml|config.toml> <fixture.json> [--json]", args[0]);
        eprintln!("Example: {} configs/account.yaml fixtures/customers.json", args[0]);
        std::process::exit(1);
    }
    let as_json = args.iter().skip(3).any(|arg| arg == "--json");

    init_logging(DEFAULT_LOG_LEVEL);

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("loading config '{}'", args[1]))?;
    let fixture = Fixture::from_file(&args[2])
        .with_context(|| format!("loading fixture '{}'", args[2]))?;

    let (load, transport) = fixture.into_backends();
    let transport = Arc::new(transport);
    let store = Arc::new(RecordingStatusStore::new());
    let collaborators = Collaborators::new(Arc::new(load), transport.clone(), transport.clone())
        .with_status_store(store.clone());

    let mut pipeline = SyncPipeline::from_config(&config, collaborators)?;
    let report = pipeline.run().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
        let saved = store.saved().await;
        println!("Status store writes: {}", saved.len());
        let records = transport.records(&config.object_type).await;
        println!("Remote {} records: {}", config.object_type, records.len());
    }

    Ok(())
}
