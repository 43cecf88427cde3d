//! Error taxonomy for the scan pipeline.
//!
//! Only two kinds of failure ever cross the public boundary: a barcode that
//! fails validation, and a catch-all for anything unexpected during
//! orchestration. Lookup-source failures are data, not errors (see
//! `LookupOutcome`), so one broken source can never abort the chain.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Barcode failed the length/charset check; reported before any network
    /// activity and never retried.
    #[error("invalid barcode: {0}")]
    InvalidBarcode(String),

    /// Anything unexpected during orchestration. Surfaced to the UI as a
    /// generic message so the state machine can always return to idle.
    #[error("scan failed: {0}")]
    Internal(String),
}
