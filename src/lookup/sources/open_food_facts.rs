//! Open Food Facts adapter: the community consumer-goods database.
//!
//! Richest source for packaged food: nutriments, ingredients, allergen tags.
//! Public API, no key required.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::lookup::{http_client, not_found, source_error, LookupOutcome, LookupSource};
use crate::product::{non_blank, or_unknown, NutritionFacts, Packaging, ProductRecord};

pub const SOURCE_NAME: &str = "OpenFoodFacts";
pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

#[derive(Debug, Deserialize)]
struct Payload {
    status: i32,
    #[serde(default)]
    product: Option<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    product_name: Option<String>,
    brands: Option<String>,
    categories: Option<String>,
    generic_name: Option<String>,
    image_url: Option<String>,
    image_front_url: Option<String>,
    quantity: Option<String>,
    ingredients_text: Option<String>,
    #[serde(default)]
    allergens_tags: Vec<String>,
    #[serde(default)]
    labels_tags: Vec<String>,
    nutriments: Option<Nutriments>,
}

#[derive(Debug, Deserialize)]
struct Nutriments {
    #[serde(rename = "energy-kcal_100g")]
    energy_kcal_100g: Option<f64>,
    fat_100g: Option<f64>,
    carbohydrates_100g: Option<f64>,
    proteins_100g: Option<f64>,
}

/// Tags arrive as `"en:milk"`; keep the readable tail.
fn strip_lang_prefix(tag: &str) -> String {
    tag.split_once(':')
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_else(|| tag.to_string())
}

pub struct OpenFoodFactsSource {
    http: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: http_client(timeout),
            base_url: base_url.into(),
        }
    }

    pub fn parse_payload(barcode: &str, body: &str) -> Result<Option<ProductRecord>> {
        let payload: Payload =
            serde_json::from_str(body).context("parsing open food facts json")?;
        if payload.status != 1 {
            return Ok(None);
        }
        let Some(item) = payload.product else {
            return Ok(None);
        };

        let mut record = ProductRecord::unknown(barcode, SOURCE_NAME);
        record.name = or_unknown(item.product_name);
        record.brand = or_unknown(item.brands);
        // Categories come as one comma-separated string; keep the first.
        record.category = non_blank(item.categories)
            .map(|c| c.split(',').next().unwrap_or("").trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());
        record.description = non_blank(item.generic_name).unwrap_or_default();
        record.image_urls = [item.image_front_url, item.image_url]
            .into_iter()
            .flatten()
            .collect();
        if let Some(q) = non_blank(item.quantity) {
            record.packaging = Some(Packaging {
                weight: None,
                volume: Some(q),
                unit: None,
            });
        }
        record.allergens = item
            .allergens_tags
            .iter()
            .map(|t| strip_lang_prefix(t))
            .collect();
        record.certifications = item
            .labels_tags
            .iter()
            .map(|t| strip_lang_prefix(t))
            .collect();

        let ingredients: Vec<String> = non_blank(item.ingredients_text)
            .map(|t| {
                t.split(',')
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if let Some(n) = item.nutriments {
            record.nutrition = Some(NutritionFacts {
                calories: n.energy_kcal_100g,
                fat: n.fat_100g.map(|v| format!("{v} g/100g")),
                carbohydrates: n.carbohydrates_100g.map(|v| format!("{v} g/100g")),
                protein: n.proteins_100g.map(|v| format!("{v} g/100g")),
                ingredients,
            });
        } else if !ingredients.is_empty() {
            record.nutrition = Some(NutritionFacts {
                calories: None,
                fat: None,
                carbohydrates: None,
                protein: None,
                ingredients,
            });
        }
        Ok(Some(record))
    }

    async fn lookup_impl(&self, barcode: &str) -> Result<Option<ProductRecord>> {
        let url = format!(
            "{}/api/v2/product/{}.json",
            self.base_url.trim_end_matches('/'),
            barcode
        );
        let resp = self.http.get(&url).send().await.context("off http get")?;
        // OFF answers 404 with a status-0 JSON body for unknown barcodes.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            anyhow::bail!("open food facts returned status {}", resp.status());
        }
        let body = resp.text().await.context("off body")?;
        Self::parse_payload(barcode, &body)
    }
}

#[async_trait]
impl LookupSource for OpenFoodFactsSource {
    async fn lookup(&self, barcode: &str) -> LookupOutcome {
        match self.lookup_impl(barcode).await {
            Ok(Some(record)) => LookupOutcome::Found(record),
            Ok(None) => not_found(SOURCE_NAME, "status 0"),
            Err(e) => source_error(SOURCE_NAME, e),
        }
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}
