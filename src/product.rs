//! Normalized product records shared by every lookup source.
//!
//! External databases each have their own schema; adapters translate into
//! this one shape and substitute neutral defaults for anything the source
//! does not supply. Everything except `barcode`/`source`/`fetched_at` is
//! optional.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::barcode;

/// Source label for records synthesized when every lookup source failed.
pub const SOURCE_GENERATED: &str = "Generated";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Fat/carb/protein kept as free-text; sources disagree on units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbohydrates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packaging {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manufacturer {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedPrice {
    pub amount: f64,
    /// ISO 4217 code, e.g. "VND", "USD".
    pub currency: String,
}

/// One product as the rest of the app sees it, regardless of which external
/// database (or the placeholder synthesizer) produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<Packaging>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<Manufacturer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_price: Option<SuggestedPrice>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certifications: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergens: Vec<String>,
    /// Name of the lookup source that produced this record.
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl ProductRecord {
    /// Neutral-default skeleton an adapter fills in with whatever its source
    /// actually supplied.
    pub fn unknown(barcode: &str, source: &str) -> Self {
        Self {
            barcode: barcode.to_string(),
            name: "Unknown".to_string(),
            brand: "Unknown".to_string(),
            category: "Unknown".to_string(),
            description: String::new(),
            image_urls: Vec::new(),
            nutrition: None,
            packaging: None,
            manufacturer: None,
            suggested_price: None,
            certifications: Vec::new(),
            allergens: Vec::new(),
            source: source.to_string(),
            fetched_at: Utc::now(),
        }
    }

    /// Last-resort record used when every lookup source came back empty.
    ///
    /// A cashier who scans an unlisted item can still complete the sale; the
    /// generic name flags the product for later enrichment. Country is
    /// inferred from the GS1 prefix so at least origin is filled for local
    /// goods.
    pub fn placeholder(barcode: &str) -> Self {
        let country = barcode::gs1_country(barcode).unwrap_or("Unknown");
        let mut record = Self::unknown(barcode, SOURCE_GENERATED);
        record.name = format!("Product {barcode}");
        record.manufacturer = Some(Manufacturer {
            name: "Unknown".to_string(),
            country: country.to_string(),
        });
        record
    }

    /// `true` for records synthesized by the resolver rather than found in
    /// any external database.
    pub fn is_generated(&self) -> bool {
        self.source == SOURCE_GENERATED
    }
}

/// Trim a free-text field from an external payload, mapping blank to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Like `non_blank`, but fall back to the neutral "Unknown" default.
pub(crate) fn or_unknown(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| "Unknown".to_string())
}
