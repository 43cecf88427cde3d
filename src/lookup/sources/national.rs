//! National GS1 registry adapter, the highest-priority source.
//!
//! The in-country registry knows local products the international databases
//! do not, so it is always tried first (see the resolver's fixed ordering).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::lookup::{http_client, not_found, source_error, LookupOutcome, LookupSource};
use crate::product::{
    non_blank, or_unknown, Manufacturer, Packaging, ProductRecord, SuggestedPrice,
};

pub const SOURCE_NAME: &str = "NationalDB";

#[derive(Debug, Deserialize)]
struct Payload {
    found: bool,
    #[serde(default)]
    product: Option<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    name: Option<String>,
    brand: Option<String>,
    category: Option<String>,
    description: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    manufacturer: Option<ItemManufacturer>,
    price: Option<f64>,
    currency: Option<String>,
    weight: Option<String>,
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemManufacturer {
    name: Option<String>,
    country: Option<String>,
}

pub struct NationalDbSource {
    http: reqwest::Client,
    base_url: String,
}

impl NationalDbSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: http_client(timeout),
            base_url: base_url.into(),
        }
    }

    /// Translate the registry payload. `Ok(None)` means the registry has no
    /// record for this barcode.
    pub fn parse_payload(barcode: &str, body: &str) -> Result<Option<ProductRecord>> {
        let payload: Payload = serde_json::from_str(body).context("parsing national db json")?;
        if !payload.found {
            return Ok(None);
        }
        let Some(item) = payload.product else {
            return Ok(None);
        };

        let mut record = ProductRecord::unknown(barcode, SOURCE_NAME);
        record.name = or_unknown(item.name);
        record.brand = or_unknown(item.brand);
        record.category = or_unknown(item.category);
        record.description = non_blank(item.description).unwrap_or_default();
        record.image_urls = item.images;
        if let Some(m) = item.manufacturer {
            record.manufacturer = Some(Manufacturer {
                name: or_unknown(m.name),
                country: or_unknown(m.country),
            });
        }
        if let Some(amount) = item.price {
            record.suggested_price = Some(SuggestedPrice {
                amount,
                currency: non_blank(item.currency).unwrap_or_else(|| "VND".to_string()),
            });
        }
        if item.weight.is_some() || item.unit.is_some() {
            record.packaging = Some(Packaging {
                weight: non_blank(item.weight),
                volume: None,
                unit: non_blank(item.unit),
            });
        }
        Ok(Some(record))
    }

    async fn lookup_impl(&self, barcode: &str) -> Result<Option<ProductRecord>> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), barcode);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("national db http get")?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("national db returned status {}", resp.status());
        }
        let body = resp.text().await.context("national db body")?;
        Self::parse_payload(barcode, &body)
    }
}

#[async_trait]
impl LookupSource for NationalDbSource {
    async fn lookup(&self, barcode: &str) -> LookupOutcome {
        match self.lookup_impl(barcode).await {
            Ok(Some(record)) => LookupOutcome::Found(record),
            Ok(None) => not_found(SOURCE_NAME, "no registry record"),
            Err(e) => source_error(SOURCE_NAME, e),
        }
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}
