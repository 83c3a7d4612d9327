//! Deal scanner.
//!
//! Sends a list of scraped deals to a structured-output chat model, asks
//! for the best-described, clearly priced picks, validates the reply into
//! a `DealSelection`, and drops any pick without a positive price.

use std::sync::Arc;
use tracing::{debug, info};

use super::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::llm::{ChatMessage, StructuredChat, StructuredRequest};
use crate::sources::DealSource;
use crate::types::{DealSelection, ScanError, ScrapedDeal};

pub struct DealScanner {
    client: Arc<dyn StructuredChat>,
}

impl DealScanner {
    pub fn new(client: Arc<dyn StructuredChat>) -> Self {
        Self { client }
    }

    /// Assemble the structured request for a non-empty list of deals.
    pub fn build_request(deals: &[ScrapedDeal]) -> StructuredRequest {
        StructuredRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_user_prompt(deals)),
            ],
            schema_name: DealSelection::SCHEMA_NAME.to_string(),
            schema: DealSelection::json_schema(),
        }
    }

    /// Scan a list of deals.
    ///
    /// Returns `Ok(None)` without calling the model when `deals` is empty.
    /// Errors from the model client are returned unchanged.
    pub async fn scan(&self, deals: &[ScrapedDeal]) -> Result<Option<DealSelection>, ScanError> {
        if deals.is_empty() {
            info!("No deals to scan");
            return Ok(None);
        }

        let request = Self::build_request(deals);
        info!(deals = deals.len(), "Calling model with structured output");
        for message in &request.messages {
            debug!(role = ?message.role, content = %message.content, "Prompt");
        }

        let raw = self.client.complete(&request).await?;
        let mut selection = DealSelection::from_model_output(&raw)?;

        let dropped = selection.retain_priced();
        info!(selected = selection.len(), dropped, "Scan complete");

        Ok(Some(selection))
    }

    /// Fetch deals from `source`, then scan them.
    pub async fn scan_source(
        &self,
        source: &dyn DealSource,
    ) -> Result<Option<DealSelection>, ScanError> {
        let deals = source
            .fetch_deals()
            .await
            .map_err(|e| ScanError::Source(format!("{}: {e:#}", source.name())))?;
        debug!(source = source.name(), count = deals.len(), "Deals fetched");
        self.scan(&deals).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
