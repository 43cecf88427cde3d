//! Barcode validation and GS1 prefix helpers.
//!
//! A barcode here is just the resolution key: 8–20 characters of digits,
//! letters, hyphen, underscore or period. Anything else is rejected before
//! the cache or any lookup source is touched.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ScanError;

/// Minimum accepted barcode length.
pub const MIN_LEN: usize = 8;
/// Maximum accepted barcode length.
pub const MAX_LEN: usize = 20;

static RE_BARCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z._-]+$").expect("barcode regex"));

/// Validate barcode shape (length + charset).
///
/// Length is checked first so callers get the more specific message for the
/// common hardware-scanner misfire (truncated burst).
pub fn validate(raw: &str) -> Result<(), ScanError> {
    let len = raw.chars().count();
    if len < MIN_LEN {
        return Err(ScanError::InvalidBarcode(format!(
            "barcode too short: {len} chars (minimum {MIN_LEN})"
        )));
    }
    if len > MAX_LEN {
        return Err(ScanError::InvalidBarcode(format!(
            "barcode too long: {len} chars (maximum {MAX_LEN})"
        )));
    }
    if !RE_BARCODE.is_match(raw) {
        return Err(ScanError::InvalidBarcode(
            "barcode contains characters outside [0-9A-Za-z._-]".to_string(),
        ));
    }
    Ok(())
}

/// Country of origin inferred from the GS1 company-prefix range.
///
/// Only the ranges the store actually encounters are mapped; everything else
/// resolves to `None` and downstream fills "Unknown".
pub fn gs1_country(barcode: &str) -> Option<&'static str> {
    let prefix: String = barcode.chars().take(3).collect();
    let p: u32 = prefix.parse().ok()?;
    let country = match p {
        893 => "Việt Nam",
        885 => "Thailand",
        880 => "South Korea",
        690..=699 => "China",
        0..=139 => "United States",
        450..=459 | 490..=499 => "Japan",
        400..=440 => "Germany",
        _ => return None,
    };
    Some(country)
}

/// `true` when the numeric prefix falls in the local (Vietnamese) GS1 range.
pub fn is_local_prefix(barcode: &str) -> bool {
    matches!(gs1_country(barcode), Some("Việt Nam"))
}
