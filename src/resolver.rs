//! # Barcode Resolver
//! Orchestrates the lookup sources in fixed priority order, consults and
//! populates the shared cache, and synthesizes a placeholder when every
//! source comes back empty.
//!
//! Policy: a resolve never fails for a valid barcode. "Degraded but
//! working" (placeholder product) always beats "blocked": an unrecognized
//! item must still be sellable at the counter.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};

use crate::barcode;
use crate::cache::ResolutionCache;
use crate::error::ScanError;
use crate::lookup::{ensure_metrics_described, LookupOutcome, LookupSource};
use crate::product::{ProductRecord, SOURCE_GENERATED};

/// Source label reported for cache hits.
pub const SOURCE_CACHE: &str = "Cache";

/// Outcome of one resolution. `live` is `true` only when a lookup source
/// answered on this very call (cache hits and placeholders are not live).
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub product: ProductRecord,
    pub source: String,
    pub live: bool,
}

pub struct BarcodeResolver {
    cache: Arc<ResolutionCache>,
    sources: Vec<Box<dyn LookupSource>>,
}

impl BarcodeResolver {
    /// `sources` is the priority order: national registry first, community
    /// databases next, commercial catch-alls last. The order is total and
    /// never reshuffled at runtime.
    pub fn new(cache: Arc<ResolutionCache>, sources: Vec<Box<dyn LookupSource>>) -> Self {
        ensure_metrics_described();
        Self { cache, sources }
    }

    /// Resolve a barcode to a usable product.
    ///
    /// Only validation can fail; everything past the shape check degrades to
    /// a cached placeholder instead of erroring.
    pub async fn resolve(&self, raw: &str) -> Result<Resolution, ScanError> {
        barcode::validate(raw)?;
        let t0 = Instant::now();

        if let Some(product) = self.cache.get(raw) {
            counter!("resolve_cache_hits_total").increment(1);
            tracing::debug!(target: "resolver", barcode = raw, "cache hit");
            histogram!("resolve_ms").record(elapsed_ms(t0));
            return Ok(Resolution {
                product,
                source: SOURCE_CACHE.to_string(),
                live: false,
            });
        }

        // Strictly sequential: a faster low-priority source must never win
        // over a slower trusted one.
        for source in &self.sources {
            match source.lookup(raw).await {
                LookupOutcome::Found(product) => {
                    counter!("lookup_found_total").increment(1);
                    tracing::info!(
                        target: "resolver",
                        barcode = raw,
                        source = source.name(),
                        "resolved from live source"
                    );
                    self.cache.put(raw, product.clone());
                    histogram!("resolve_ms").record(elapsed_ms(t0));
                    return Ok(Resolution {
                        product,
                        source: source.name().to_string(),
                        live: true,
                    });
                }
                LookupOutcome::NotFound { reason, .. } => {
                    tracing::debug!(
                        target: "resolver",
                        barcode = raw,
                        source = source.name(),
                        reason,
                        "no data, trying next source"
                    );
                }
                LookupOutcome::SourceError { reason, .. } => {
                    // Already counted/logged at the source boundary; the
                    // chain absorbs it and moves on.
                    tracing::debug!(
                        target: "resolver",
                        barcode = raw,
                        source = source.name(),
                        reason,
                        "source error, trying next source"
                    );
                }
            }
        }

        // Every source exhausted: synthesize and cache the placeholder so a
        // genuinely unlisted barcode does not re-hit the chain on each scan.
        let product = ProductRecord::placeholder(raw);
        counter!("resolve_generated_total").increment(1);
        tracing::info!(target: "resolver", barcode = raw, "all sources empty, generated placeholder");
        self.cache.put(raw, product.clone());
        histogram!("resolve_ms").record(elapsed_ms(t0));
        Ok(Resolution {
            product,
            source: SOURCE_GENERATED.to_string(),
            live: false,
        })
    }

    /// Shared cache handle (for diagnostics and the composition root).
    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

fn elapsed_ms(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64() * 1_000.0
}
