// src/lookup/mod.rs
pub mod sources;

use std::time::Duration;

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::product::ProductRecord;

/// One-time metrics registration (so series show up on a recorder).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("lookup_found_total", "Lookups answered by a live source.");
        describe_counter!(
            "lookup_not_found_total",
            "Lookups a source answered with no data."
        );
        describe_counter!(
            "lookup_source_errors_total",
            "Source transport/parse failures."
        );
        describe_counter!("resolve_cache_hits_total", "Resolutions served from cache.");
        describe_counter!(
            "resolve_generated_total",
            "Resolutions that fell through to a placeholder."
        );
        describe_histogram!("resolve_ms", "End-to-end resolve time in milliseconds.");
    });
}

/// Result of a single source lookup.
///
/// "No data" and "source broken" are distinct tags so the resolver can tell
/// a clean miss from an outage; neither is an `Err`, since a failing source must
/// never abort the fallback chain.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    Found(ProductRecord),
    NotFound {
        source: &'static str,
        reason: String,
    },
    SourceError {
        source: &'static str,
        reason: String,
    },
}

impl LookupOutcome {
    pub fn source(&self) -> &'static str {
        match self {
            LookupOutcome::Found(_) => "",
            LookupOutcome::NotFound { source, .. } => source,
            LookupOutcome::SourceError { source, .. } => source,
        }
    }
}

/// One external product database. Implementations translate their source's
/// schema into `ProductRecord` and absorb every failure into the outcome.
#[async_trait::async_trait]
pub trait LookupSource: Send + Sync {
    async fn lookup(&self, barcode: &str) -> LookupOutcome;
    fn name(&self) -> &'static str;
}

/// Shared client builder: each adapter gets its own `reqwest::Client` with
/// an explicit per-call deadline so one slow external source cannot stall
/// the whole fallback chain.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("barcode-scan-pipeline/0.1")
        .connect_timeout(Duration::from_secs(2).min(timeout))
        .timeout(timeout)
        .build()
        .expect("reqwest client")
}

/// Map an adapter-internal failure into the `SourceError` tag, logging it
/// once at the boundary.
pub(crate) fn source_error(source: &'static str, err: anyhow::Error) -> LookupOutcome {
    tracing::warn!(target: "lookup", source, error = ?err, "source lookup failed");
    metrics::counter!("lookup_source_errors_total").increment(1);
    LookupOutcome::SourceError {
        source,
        reason: format!("{err:#}"),
    }
}

/// Record the "no data" outcome for a source.
pub(crate) fn not_found(source: &'static str, reason: impl Into<String>) -> LookupOutcome {
    metrics::counter!("lookup_not_found_total").increment(1);
    LookupOutcome::NotFound {
        source,
        reason: reason.into(),
    }
}
