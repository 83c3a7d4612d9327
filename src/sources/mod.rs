//! Deal sources.
//!
//! Defines the `DealSource` trait and provides the built-in demo records
//! and a JSON-file source. A real feed scraper would be another
//! implementor of the same trait.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{SourceConfig, SourceKind};
use crate::types::ScrapedDeal;

/// Abstraction over wherever scraped deals come from.
#[async_trait]
pub trait DealSource: Send + Sync {
    /// Produce the ordered list of deals to scan.
    async fn fetch_deals(&self) -> Result<Vec<ScrapedDeal>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Build the source selected in config.
pub fn from_config(cfg: &SourceConfig) -> Result<Box<dyn DealSource>> {
    match cfg.kind {
        SourceKind::Demo => Ok(Box::new(StaticSource::demo())),
        SourceKind::File => {
            let path = cfg
                .path
                .clone()
                .context("source.kind = \"file\" requires source.path")?;
            Ok(Box::new(JsonFileSource::new(path)))
        }
    }
}

// ---------------------------------------------------------------------------
// Static source
// ---------------------------------------------------------------------------

/// A fixed in-memory list of deals.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    deals: Vec<ScrapedDeal>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, deals: Vec<ScrapedDeal>) -> Self {
        Self { name: name.into(), deals }
    }

    /// The hardcoded record the binary scans by default.
    pub fn demo() -> Self {
        Self::new("demo", vec![headphones()])
    }

    /// All three hardcoded records, for trying a larger prompt.
    pub fn demo_extended() -> Self {
        Self::new("demo-extended", vec![headphones(), espresso_machine(), europe_flights()])
    }
}

#[async_trait]
impl DealSource for StaticSource {
    async fn fetch_deals(&self) -> Result<Vec<ScrapedDeal>> {
        Ok(self.deals.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn headphones() -> ScrapedDeal {
    ScrapedDeal {
        category: "Electronics".to_string(),
        title: "50% Off Premium Headphones".to_string(),
        summary: "Top-brand noise-cancelling headphones at half price".to_string(),
        url: "https://example.com/deal/headphones".to_string(),
        details: "Limited-time offer. High-fidelity sound and comfortable over-ear design. Price only $69.99".to_string(),
        features: "Wireless, Active Noise Cancellation, 30-hour battery life".to_string(),
    }
}

fn espresso_machine() -> ScrapedDeal {
    ScrapedDeal {
        category: "Kitchen".to_string(),
        title: "Discounted Espresso Machine".to_string(),
        summary: "Up to 40% off on select espresso machines".to_string(),
        url: "https://example.com/deal/espresso-machine".to_string(),
        details: "Brew café-quality espresso at home with ease. Prices starting at $179.99".to_string(),
        features: "Built-in grinder, Milk frother, Adjustable brew strength".to_string(),
    }
}

fn europe_flights() -> ScrapedDeal {
    ScrapedDeal {
        category: "Travel".to_string(),
        title: "Budget Flights to Europe".to_string(),
        summary: "Fly to popular European destinations at reduced rates".to_string(),
        url: "https://example.com/deal/flights-europe".to_string(),
        details: "Book now for discounted round-trip tickets across major EU cities.".to_string(),
        features: "Flexible travel dates, Multiple departure cities, No booking fees".to_string(),
    }
}

// ---------------------------------------------------------------------------
// JSON file source
// ---------------------------------------------------------------------------

/// Reads a JSON array of `ScrapedDeal` objects from disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DealSource for JsonFileSource {
    async fn fetch_deals(&self) -> Result<Vec<ScrapedDeal>> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read deals from {}", self.path.display()))?;
        let deals: Vec<ScrapedDeal> = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse deals from {}", self.path.display()))?;

        info!(path = %self.path.display(), count = deals.len(), "Deals loaded from file");
        Ok(deals)
    }

    fn name(&self) -> &str {
        "file"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
