// src/lib.rs
// Public library surface for integration tests (and the embedding POS app).

pub mod barcode;
pub mod cache;
pub mod capture;
pub mod config;
pub mod error;
pub mod history;
pub mod lookup;
pub mod orchestrator;
pub mod product;
pub mod resolver;

// ---- Re-exports for stable public API ----
pub use crate::capture::{Capture, CaptureMethod};
pub use crate::config::PipelineConfig;
pub use crate::error::ScanError;
pub use crate::lookup::{LookupOutcome, LookupSource};
pub use crate::orchestrator::{ScanEvent, ScanOptions, ScanOrchestrator, ScanStage};
pub use crate::product::ProductRecord;
pub use crate::resolver::{BarcodeResolver, Resolution};
