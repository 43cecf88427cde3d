//! Barcode Lookup adapter: commercial catch-all database, keyed access.
//!
//! Lowest priority: broad coverage but generic data. Requires
//! `BARCODE_LOOKUP_API_KEY`; without a key the adapter reports a source
//! error and the chain moves on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::lookup::{http_client, not_found, source_error, LookupOutcome, LookupSource};
use crate::product::{non_blank, or_unknown, Manufacturer, NutritionFacts, ProductRecord};

pub const SOURCE_NAME: &str = "BarcodeLookup";
pub const DEFAULT_BASE_URL: &str = "https://api.barcodelookup.com/v3";

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    products: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    brand: Option<String>,
    category: Option<String>,
    description: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    manufacturer: Option<String>,
    ingredients: Option<String>,
    nutrition_facts: Option<String>,
}

pub struct BarcodeLookupSource {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BarcodeLookupSource {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http: http_client(timeout),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn parse_payload(barcode: &str, body: &str) -> Result<Option<ProductRecord>> {
        let payload: Payload =
            serde_json::from_str(body).context("parsing barcode lookup json")?;
        let Some(item) = payload.products.into_iter().next() else {
            return Ok(None);
        };

        let mut record = ProductRecord::unknown(barcode, SOURCE_NAME);
        record.name = or_unknown(item.title);
        record.brand = or_unknown(item.brand);
        record.category = or_unknown(item.category);
        record.description = non_blank(item.description).unwrap_or_default();
        record.image_urls = item.images;
        if let Some(m) = non_blank(item.manufacturer) {
            record.manufacturer = Some(Manufacturer {
                name: m,
                country: "Unknown".to_string(),
            });
        }
        let ingredients: Vec<String> = non_blank(item.ingredients)
            .map(|t| {
                t.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if !ingredients.is_empty() || item.nutrition_facts.is_some() {
            // This source ships nutrition as one free-text blob; keep it in
            // the description-ish fat field rather than guessing numbers.
            record.nutrition = Some(NutritionFacts {
                calories: None,
                fat: non_blank(item.nutrition_facts),
                carbohydrates: None,
                protein: None,
                ingredients,
            });
        }
        Ok(Some(record))
    }

    async fn lookup_impl(&self, barcode: &str) -> Result<Option<ProductRecord>> {
        let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            anyhow::bail!("api key not configured");
        };
        let url = format!(
            "{}/products?barcode={}&key={}",
            self.base_url.trim_end_matches('/'),
            barcode,
            key
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("barcode lookup http get")?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("barcode lookup returned status {}", resp.status());
        }
        let body = resp.text().await.context("barcode lookup body")?;
        Self::parse_payload(barcode, &body)
    }
}

#[async_trait]
impl LookupSource for BarcodeLookupSource {
    async fn lookup(&self, barcode: &str) -> LookupOutcome {
        match self.lookup_impl(barcode).await {
            Ok(Some(record)) => LookupOutcome::Found(record),
            Ok(None) => not_found(SOURCE_NAME, "no products"),
            Err(e) => source_error(SOURCE_NAME, e),
        }
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_product() {
        let body = r#"{
            "products": [{
                "barcode_number": "8901234567894",
                "title": "Instant Noodles",
                "brand": "NoodleCo",
                "category": "Food",
                "manufacturer": "NoodleCo Ltd",
                "ingredients": "wheat flour, palm oil, salt"
            }]
        }"#;
        let rec = BarcodeLookupSource::parse_payload("8901234567894", body)
            .unwrap()
            .unwrap();
        assert_eq!(rec.name, "Instant Noodles");
        assert_eq!(rec.manufacturer.unwrap().name, "NoodleCo Ltd");
        assert_eq!(rec.nutrition.unwrap().ingredients.len(), 3);
    }

    #[test]
    fn empty_products_maps_to_none() {
        assert!(
            BarcodeLookupSource::parse_payload("8901234567894", r#"{ "products": [] }"#)
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_a_source_error() {
        let src = BarcodeLookupSource::new(DEFAULT_BASE_URL, None, Duration::from_secs(1));
        match src.lookup("8901234567894").await {
            LookupOutcome::SourceError { source, reason } => {
                assert_eq!(source, SOURCE_NAME);
                assert!(reason.contains("api key"));
            }
            other => panic!("expected SourceError, got {other:?}"),
        }
    }
}
