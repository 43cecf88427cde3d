// src/config.rs
//! Pipeline configuration: source endpoints, API keys, timeouts, capture
//! tuning. Loaded from `config/scanner.toml` with env overrides; every field
//! has a working default so a bare checkout still runs (minus the keyed
//! commercial source).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cache::ResolutionCache;
use crate::lookup::sources::{
    barcode_lookup, open_food_facts, upc_item_db, BarcodeLookupSource, NationalDbSource,
    OpenFoodFactsSource, UpcItemDbSource,
};
use crate::lookup::LookupSource;
use crate::resolver::BarcodeResolver;

pub const DEFAULT_CONFIG_PATH: &str = "config/scanner.toml";
pub const ENV_CONFIG_PATH: &str = "SCANNER_CONFIG_PATH";
pub const ENV_BARCODE_LOOKUP_API_KEY: &str = "BARCODE_LOOKUP_API_KEY";

pub const DEFAULT_NATIONAL_BASE_URL: &str = "https://api.gs1.org.vn/v1/products";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub national_base_url: String,
    pub open_food_facts_base_url: String,
    pub upc_item_db_base_url: String,
    pub barcode_lookup_base_url: String,
    pub barcode_lookup_api_key: Option<String>,
    /// Per-source request deadline; keeps one slow database from stalling
    /// the whole fallback chain.
    pub lookup_timeout_secs: u64,
    pub cache_ttl_hours: u64,
    pub wedge_gap_ms: u64,
    pub frame_interval_ms: u64,
    pub hold_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            national_base_url: DEFAULT_NATIONAL_BASE_URL.to_string(),
            open_food_facts_base_url: open_food_facts::DEFAULT_BASE_URL.to_string(),
            upc_item_db_base_url: upc_item_db::DEFAULT_BASE_URL.to_string(),
            barcode_lookup_base_url: barcode_lookup::DEFAULT_BASE_URL.to_string(),
            barcode_lookup_api_key: None,
            lookup_timeout_secs: 4,
            cache_ttl_hours: 24,
            wedge_gap_ms: 100,
            frame_interval_ms: 500,
            hold_delay_ms: 2_000,
        }
    }
}

impl PipelineConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scanner config from {}", path.display()))?;
        let mut cfg: PipelineConfig =
            toml::from_str(&content).context("parsing scanner config toml")?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $SCANNER_CONFIG_PATH
    /// 2) config/scanner.toml
    /// 3) built-in defaults
    pub fn load_default() -> Self {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|_| std::path::PathBuf::from(DEFAULT_CONFIG_PATH));
        if path.exists() {
            match Self::load_from(&path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(error = ?e, path = %path.display(), "bad scanner config, using defaults");
                }
            }
        }
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Secrets come from the environment, never from the config file.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(ENV_BARCODE_LOOKUP_API_KEY) {
            if !key.trim().is_empty() {
                self.barcode_lookup_api_key = Some(key.trim().to_string());
            }
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours.max(1) * 3600)
    }

    pub fn wedge_gap(&self) -> Duration {
        Duration::from_millis(self.wedge_gap_ms.max(1))
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(50))
    }

    pub fn hold_delay(&self) -> Duration {
        Duration::from_millis(self.hold_delay_ms)
    }

    /// The fixed fallback chain, in priority order: national registry, then
    /// community, then commercial databases.
    pub fn sources(&self) -> Vec<Box<dyn LookupSource>> {
        let timeout = self.lookup_timeout();
        vec![
            Box::new(NationalDbSource::new(&self.national_base_url, timeout)),
            Box::new(OpenFoodFactsSource::new(
                &self.open_food_facts_base_url,
                timeout,
            )),
            Box::new(UpcItemDbSource::new(&self.upc_item_db_base_url, timeout)),
            Box::new(BarcodeLookupSource::new(
                &self.barcode_lookup_base_url,
                self.barcode_lookup_api_key.clone(),
                timeout,
            )),
        ]
    }

    /// Composition-root convenience: cache + chain wired into a resolver.
    pub fn build_resolver(&self) -> Arc<BarcodeResolver> {
        let cache = Arc::new(ResolutionCache::with_ttl(self.cache_ttl()));
        Arc::new(BarcodeResolver::new(cache, self.sources()))
    }
}
