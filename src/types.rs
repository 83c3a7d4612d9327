//! Shared types for the DEALSCAN agent.
//!
//! Input records scraped from deal feeds, the model-curated selection
//! returned by a scan, and the error taxonomy of the scan contract.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Scraped deal (input)
// ---------------------------------------------------------------------------

/// A deal as retrieved from a feed, before any model curation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedDeal {
    pub category: String,
    pub title: String,
    pub summary: String,
    pub url: String,
    pub details: String,
    pub features: String,
}

impl fmt::Display for ScrapedDeal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.title)
    }
}

impl ScrapedDeal {
    /// Longer labelled description used when calling a model.
    pub fn describe(&self) -> String {
        format!(
            "Title: {}\nDetails: {}\nFeatures: {}\nURL: {}",
            self.title,
            self.details.trim(),
            self.features.trim(),
            self.url,
        )
    }

    /// Helper to build a test/sample deal with sensible defaults.
    #[cfg(test)]
    pub fn sample() -> Self {
        ScrapedDeal {
            category: "Electronics".to_string(),
            title: "50% Off Premium Headphones".to_string(),
            summary: "Top-brand noise-cancelling headphones at half price".to_string(),
            url: "https://example.com/deal/headphones".to_string(),
            details: "Limited-time offer. High-fidelity sound and comfortable over-ear design. Price only $69.99".to_string(),
            features: "Wireless, Active Noise Cancellation, 30-hour battery life".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Deal selection (output)
// ---------------------------------------------------------------------------

/// One deal chosen and summarised by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Deal {
    pub product_description: String,
    pub price: f64,
    pub url: String,
}

impl Deal {
    /// A deal is kept only with a finite, strictly positive price.
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2} | {}\n  {}", self.price, self.url, self.product_description)
    }
}

/// The structured output of a scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DealSelection {
    pub deals: Vec<Deal>,
}

impl DealSelection {
    /// Name under which the schema is registered with the model API.
    pub const SCHEMA_NAME: &'static str = "DealSelection";

    /// Strict JSON schema sent as the structured-output response format.
    ///
    /// Mirrors the field layout of [`DealSelection`] and [`Deal`]; every
    /// property is required and no extra properties are allowed.
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "deals": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "product_description": { "type": "string" },
                            "price": { "type": "number" },
                            "url": { "type": "string" }
                        },
                        "required": ["product_description", "price", "url"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["deals"],
            "additionalProperties": false
        })
    }

    /// Validate raw model output against the selection shape.
    pub fn from_model_output(text: &str) -> Result<Self, ScanError> {
        serde_json::from_str(text).map_err(|e| {
            ScanError::SchemaValidation(format!("response does not match {}: {e}", Self::SCHEMA_NAME))
        })
    }

    /// Drop every deal without a strictly positive price, keeping order.
    /// Returns the number of deals removed.
    pub fn retain_priced(&mut self) -> usize {
        let before = self.deals.len();
        self.deals.retain(Deal::has_valid_price);
        before - self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    pub fn len(&self) -> usize {
        self.deals.len()
    }
}

impl fmt::Display for DealSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deals.is_empty() {
            return write!(f, "No deals selected");
        }
        for (i, deal) in self.deals.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {deal}", i + 1)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures of a scan. An empty input is not an error (the scan returns `None`).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    /// Network, authentication, rate limit, or any other provider failure.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// The model output does not conform to the expected structured shape.
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Deal source error: {0}")]
    Source(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
