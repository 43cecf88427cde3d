//! Demo that treats stdin lines as manual barcode entries and resolves them
//! through the full pipeline (real lookup sources, real cache).
//!
//! Usage: `cargo run --bin scan-demo`, then type barcodes one per line.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use barcode_scan_pipeline::capture::manual::ManualEntry;
use barcode_scan_pipeline::{CaptureMethod, PipelineConfig, ScanOptions, ScanOrchestrator};

#[tokio::main]
async fn main() {
    // Load .env in local/dev (BARCODE_LOOKUP_API_KEY etc.); no-op otherwise.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cfg = PipelineConfig::load_default();
    let resolver = cfg.build_resolver();
    tracing::info!(sources = ?resolver.source_names(), "scan pipeline ready");

    let orchestrator = ScanOrchestrator::new(
        resolver,
        ScanOptions::new(|ev| {
            println!(
                "[{}] {} -> {} ({}, live: {}, {} ms)",
                ev.method.as_str(),
                ev.barcode,
                ev.product.name,
                ev.source,
                ev.live,
                ev.elapsed_ms
            );
        })
        .on_error(|msg| println!("error: {msg}"))
        .hold_delay(Duration::from_millis(200)),
    );

    let mut entry = ManualEntry::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("type a barcode and press Enter (Ctrl-D to quit):");
    while let Ok(Some(line)) = lines.next_line().await {
        entry.set(line);
        let Some(capture) = entry.submit() else {
            continue;
        };
        orchestrator.submit(&capture.raw, CaptureMethod::Manual).await;
    }

    let recent = orchestrator.recent(10);
    println!("session scans: {}", recent.len());
}
