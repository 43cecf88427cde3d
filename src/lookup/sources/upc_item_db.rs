//! UPCitemdb adapter: general-purpose barcode database (trial tier).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::lookup::{http_client, not_found, source_error, LookupOutcome, LookupSource};
use crate::product::{non_blank, or_unknown, Packaging, ProductRecord, SuggestedPrice};

pub const SOURCE_NAME: &str = "UPCitemdb";
pub const DEFAULT_BASE_URL: &str = "https://api.upcitemdb.com/prod/trial";

#[derive(Debug, Deserialize)]
struct Payload {
    code: String,
    #[serde(default)]
    total: u32,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    brand: Option<String>,
    category: Option<String>,
    description: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    weight: Option<String>,
    lowest_recorded_price: Option<f64>,
    currency: Option<String>,
}

pub struct UpcItemDbSource {
    http: reqwest::Client,
    base_url: String,
}

impl UpcItemDbSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: http_client(timeout),
            base_url: base_url.into(),
        }
    }

    pub fn parse_payload(barcode: &str, body: &str) -> Result<Option<ProductRecord>> {
        let payload: Payload = serde_json::from_str(body).context("parsing upcitemdb json")?;
        if payload.code != "OK" {
            anyhow::bail!("upcitemdb code {}", payload.code);
        }
        if payload.total == 0 {
            return Ok(None);
        }
        let Some(item) = payload.items.into_iter().next() else {
            return Ok(None);
        };

        let mut record = ProductRecord::unknown(barcode, SOURCE_NAME);
        record.name = or_unknown(item.title);
        record.brand = or_unknown(item.brand);
        // Categories come as a " > " path; keep the leaf.
        record.category = non_blank(item.category)
            .map(|c| c.rsplit('>').next().unwrap_or("").trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        record.description = non_blank(item.description).unwrap_or_default();
        record.image_urls = item.images;
        if let Some(w) = non_blank(item.weight) {
            record.packaging = Some(Packaging {
                weight: Some(w),
                volume: None,
                unit: None,
            });
        }
        if let Some(amount) = item.lowest_recorded_price {
            record.suggested_price = Some(SuggestedPrice {
                amount,
                currency: non_blank(item.currency).unwrap_or_else(|| "USD".to_string()),
            });
        }
        Ok(Some(record))
    }

    async fn lookup_impl(&self, barcode: &str) -> Result<Option<ProductRecord>> {
        let url = format!(
            "{}/lookup?upc={}",
            self.base_url.trim_end_matches('/'),
            barcode
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("upcitemdb http get")?;
        // The trial tier answers 404 with code INVALID_UPC for unknown codes.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("upcitemdb returned status {}", resp.status());
        }
        let body = resp.text().await.context("upcitemdb body")?;
        Self::parse_payload(barcode, &body)
    }
}

#[async_trait]
impl LookupSource for UpcItemDbSource {
    async fn lookup(&self, barcode: &str) -> LookupOutcome {
        match self.lookup_impl(barcode).await {
            Ok(Some(record)) => LookupOutcome::Found(record),
            Ok(None) => not_found(SOURCE_NAME, "zero items"),
            Err(e) => source_error(SOURCE_NAME, e),
        }
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}
