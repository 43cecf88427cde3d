//! # Scan Orchestrator
//! The stateful coordinator a UI binds to. Serializes concurrent scan
//! requests (one in flight, extras silently dropped), drives the resolver,
//! publishes incremental progress on a watch channel, and delivers exactly
//! one callback per accepted scan.
//!
//! State machine: `Idle → Scanning → LookingUp → (Success | Fallback |
//! Error) → Idle`, the terminal stage held for a short display delay so
//! progress indicators have time to show the outcome.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::barcode;
use crate::capture::CaptureMethod;
use crate::error::ScanError;
use crate::history::ScanHistory;
use crate::product::ProductRecord;
use crate::resolver::BarcodeResolver;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scan_submitted_total", "Scan requests accepted or dropped.");
        describe_counter!(
            "scan_dropped_inflight_total",
            "Scan requests dropped by the re-entrancy guard."
        );
        describe_counter!("scan_invalid_total", "Scans rejected by validation.");
    });
}

/// Observable progress stage for UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanStage {
    Idle,
    Scanning,
    LookingUp,
    Success,
    /// Resolution fell through to a generated placeholder.
    Fallback,
    Error,
}

/// One finished scan attempt, delivered to the caller's callback and kept in
/// the session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub barcode: String,
    /// Always present: the resolver degrades to a placeholder rather than
    /// failing, so even an unlisted item is actionable downstream.
    pub product: ProductRecord,
    /// `true` when a lookup source answered on this call (not cache, not
    /// placeholder).
    pub live: bool,
    pub source: String,
    pub method: CaptureMethod,
    pub at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

pub type ProductFoundFn = dyn Fn(ScanEvent) + Send + Sync;
pub type ScanErrorFn = dyn Fn(String) + Send + Sync;

/// Caller-facing configuration, mirroring the options a POS screen passes
/// when it mounts the scanner.
#[derive(Clone)]
pub struct ScanOptions {
    pub on_product_found: Arc<ProductFoundFn>,
    pub on_error: Option<Arc<ScanErrorFn>>,
    /// How long a terminal stage stays visible before reset to `Idle`.
    pub hold_delay: Duration,
    /// When `false`, intermediate stages are not published (terminal stages
    /// always are).
    pub show_progress: bool,
    pub history_capacity: usize,
}

impl ScanOptions {
    pub fn new(on_product_found: impl Fn(ScanEvent) + Send + Sync + 'static) -> Self {
        Self {
            on_product_found: Arc::new(on_product_found),
            on_error: None,
            hold_delay: Duration::from_secs(2),
            show_progress: true,
            history_capacity: 50,
        }
    }

    pub fn on_error(mut self, f: impl Fn(String) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn hold_delay(mut self, d: Duration) -> Self {
        self.hold_delay = d;
        self
    }

    pub fn show_progress(mut self, on: bool) -> Self {
        self.show_progress = on;
        self
    }
}

pub struct ScanOrchestrator {
    resolver: Arc<BarcodeResolver>,
    opts: ScanOptions,
    stage_tx: watch::Sender<ScanStage>,
    in_flight: AtomicBool,
    /// Bumped per accepted scan; a stale display-hold reset quietly loses to
    /// any newer scan.
    generation: Arc<AtomicU64>,
    history: ScanHistory,
}

impl ScanOrchestrator {
    pub fn new(resolver: Arc<BarcodeResolver>, opts: ScanOptions) -> Self {
        ensure_metrics_described();
        let (stage_tx, _) = watch::channel(ScanStage::Idle);
        Self {
            history: ScanHistory::with_capacity(opts.history_capacity),
            resolver,
            opts,
            stage_tx,
            in_flight: AtomicBool::new(false),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to progress updates.
    pub fn stage(&self) -> watch::Receiver<ScanStage> {
        self.stage_tx.subscribe()
    }

    pub fn current_stage(&self) -> ScanStage {
        *self.stage_tx.borrow()
    }

    /// Last `n` finished scans of this session, newest last.
    pub fn recent(&self, n: usize) -> Vec<ScanEvent> {
        self.history.snapshot_last_n(n)
    }

    /// Submit one captured barcode. Fire-and-forget from the caller's view:
    /// the result arrives via the configured callbacks, exactly once.
    ///
    /// A submit while another scan is in flight is a silent no-op: a
    /// double-triggered scanner must not race two lookups into the same UI
    /// state.
    pub async fn submit(&self, raw: &str, method: CaptureMethod) {
        counter!("scan_submitted_total").increment(1);
        if self.in_flight.swap(true, Ordering::SeqCst) {
            counter!("scan_dropped_inflight_total").increment(1);
            tracing::debug!(
                target: "orchestrator",
                barcode = raw,
                method = method.as_str(),
                "scan dropped, another is in flight"
            );
            return;
        }
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish_progress(ScanStage::Scanning);

        // Reject obviously bad input before the resolver is ever invoked.
        if let Err(e) = barcode::validate(raw) {
            counter!("scan_invalid_total").increment(1);
            self.finish_error(gen, e.to_string());
            return;
        }

        self.publish_progress(ScanStage::LookingUp);
        let t0 = Instant::now();
        match self.resolver.resolve(raw).await {
            Ok(res) => {
                let event = ScanEvent {
                    barcode: raw.to_string(),
                    product: res.product,
                    live: res.live,
                    source: res.source,
                    method,
                    at: Utc::now(),
                    elapsed_ms: t0.elapsed().as_millis() as u64,
                };
                let stage = if event.product.is_generated() {
                    ScanStage::Fallback
                } else {
                    ScanStage::Success
                };
                self.stage_tx.send_replace(stage);
                self.history.push(&event);
                (self.opts.on_product_found)(event);
                self.release_and_schedule_reset(gen);
            }
            // The resolver only fails on validation, which was already
            // checked, but every error path must still release the guard.
            Err(ScanError::InvalidBarcode(msg)) => {
                counter!("scan_invalid_total").increment(1);
                self.finish_error(gen, format!("invalid barcode: {msg}"));
            }
            Err(e) => {
                tracing::warn!(target: "orchestrator", error = %e, "unexpected resolver failure");
                self.finish_error(gen, "scan failed, please try again".to_string());
            }
        }
    }

    fn publish_progress(&self, stage: ScanStage) {
        if self.opts.show_progress {
            self.stage_tx.send_replace(stage);
        }
    }

    fn finish_error(&self, gen: u64, message: String) {
        self.stage_tx.send_replace(ScanStage::Error);
        match &self.opts.on_error {
            Some(cb) => cb(message),
            None => tracing::warn!(target: "orchestrator", message, "scan error (no handler)"),
        }
        self.release_and_schedule_reset(gen);
    }

    fn release_and_schedule_reset(&self, gen: u64) {
        self.in_flight.store(false, Ordering::SeqCst);
        let stage_tx = self.stage_tx.clone();
        let generation = Arc::clone(&self.generation);
        let delay = self.opts.hold_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) == gen {
                stage_tx.send_replace(ScanStage::Idle);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResolutionCache;
    use crate::lookup::{LookupOutcome, LookupSource};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct SlowFound {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl LookupSource for SlowFound {
        async fn lookup(&self, barcode: &str) -> LookupOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            LookupOutcome::Found(ProductRecord::unknown(barcode, "Slow"))
        }
        fn name(&self) -> &'static str {
            "Slow"
        }
    }

    fn orchestrator_with_source(
        delay: Duration,
    ) -> (Arc<ScanOrchestrator>, Arc<AtomicUsize>, Arc<Mutex<Vec<ScanEvent>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Arc::new(BarcodeResolver::new(
            Arc::new(ResolutionCache::new_24h()),
            vec![Box::new(SlowFound {
                delay,
                calls: calls.clone(),
            })],
        ));
        let events: Arc<Mutex<Vec<ScanEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let opts = ScanOptions::new(move |ev| sink.lock().unwrap().push(ev))
            .hold_delay(Duration::from_millis(20));
        (Arc::new(ScanOrchestrator::new(resolver, opts)), calls, events)
    }

    #[tokio::test]
    async fn successful_scan_runs_the_full_state_machine() {
        let (orch, _, events) = orchestrator_with_source(Duration::ZERO);
        orch.submit("8934673001234", CaptureMethod::Keyboard).await;

        assert_eq!(orch.current_stage(), ScanStage::Success);
        let evs = events.lock().unwrap();
        assert_eq!(evs.len(), 1);
        assert!(evs[0].live);
        assert_eq!(evs[0].method, CaptureMethod::Keyboard);

        drop(evs);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(orch.current_stage(), ScanStage::Idle);
        assert_eq!(orch.recent(10).len(), 1);
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_dropped() {
        let (orch, calls, events) = orchestrator_with_source(Duration::from_millis(150));

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.submit("8934673001234", CaptureMethod::Keyboard).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        orch.submit("0360002914529", CaptureMethod::Keyboard).await;
        first.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_barcode_reports_error_and_recovers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Arc::new(BarcodeResolver::new(
            Arc::new(ResolutionCache::new_24h()),
            vec![Box::new(SlowFound {
                delay: Duration::ZERO,
                calls: calls.clone(),
            })],
        ));
        let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let orch = ScanOrchestrator::new(
            resolver,
            ScanOptions::new(|_| panic!("no product expected"))
                .on_error(move |msg| sink.lock().unwrap().push(msg))
                .hold_delay(Duration::from_millis(10)),
        );

        orch.submit("abc", CaptureMethod::Manual).await;
        assert_eq!(orch.current_stage(), ScanStage::Error);
        assert!(errors.lock().unwrap()[0].contains("too short"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(orch.current_stage(), ScanStage::Idle);
    }

    #[tokio::test]
    async fn placeholder_resolution_shows_fallback_stage() {
        let resolver = Arc::new(BarcodeResolver::new(
            Arc::new(ResolutionCache::new_24h()),
            vec![],
        ));
        let events: Arc<Mutex<Vec<ScanEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let orch = ScanOrchestrator::new(
            resolver,
            ScanOptions::new(move |ev| sink.lock().unwrap().push(ev))
                .hold_delay(Duration::from_millis(10)),
        );

        orch.submit("8934673001234", CaptureMethod::Camera).await;
        assert_eq!(orch.current_stage(), ScanStage::Fallback);
        let evs = events.lock().unwrap();
        assert!(!evs[0].live);
        assert!(evs[0].product.is_generated());
    }

    #[tokio::test]
    async fn quick_follow_up_scan_is_not_clobbered_by_stale_reset() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = Arc::new(BarcodeResolver::new(
            Arc::new(ResolutionCache::new_24h()),
            vec![Box::new(SlowFound {
                delay: Duration::ZERO,
                calls,
            })],
        ));
        let orch = ScanOrchestrator::new(
            resolver,
            ScanOptions::new(|_| {}).hold_delay(Duration::from_millis(50)),
        );

        orch.submit("8934673001234", CaptureMethod::Keyboard).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        // Second scan lands inside the first scan's hold window.
        orch.submit("0360002914529", CaptureMethod::Keyboard).await;

        // Past the first scan's reset point, before the second's: the stale
        // reset must not force Idle on the newer result.
        tokio::time::sleep(Duration::from_millis(35)).await;
        assert_eq!(orch.current_stage(), ScanStage::Success);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(orch.current_stage(), ScanStage::Idle);
    }
}
