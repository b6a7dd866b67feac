use crate::config::Config;
use crate::enrichment::UpstreamOutcome;
use crate::errors::AppError;
use crate::models::{AccountEnrichRequest, Candidate, SearchDetail, SearchListing};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Budget for one search-detail fetch; a slower upstream drops the candidate.
pub const DETAIL_TIMEOUT: Duration = Duration::from_millis(900);
/// Budget for one account enrichment call.
pub const ENRICH_TIMEOUT: Duration = Duration::from_millis(800);

/// Client for the Pronto lead/company enrichment API.
#[derive(Clone)]
pub struct ProntoClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ProntoClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.pronto_base_url.clone(),
            api_key: config.pronto_api_key.clone(),
        }
    }

    /// Authenticated GET returning the raw upstream JSON; non-success
    /// surfaces the upstream status and body unmodified.
    pub async fn get_json(&self, path: &str) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_upstream_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse Pronto response: {}", e)))
    }

    /// Authenticated POST returning the raw upstream JSON.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_upstream_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse Pronto response: {}", e)))
    }

    /// Lists all searches. Any failure here is fatal to the caller.
    pub async fn list_searches(&self) -> Result<Vec<Candidate>, AppError> {
        let body = self.get_json("/searches").await?;
        let listing: SearchListing = serde_json::from_value(body).map_err(|e| {
            AppError::Internal(format!("Failed to parse searches listing: {}", e))
        })?;
        Ok(listing.searches)
    }

    /// Fetches the detail payload of one search, bounded at 900ms.
    ///
    /// Failures and timeouts are non-fatal: the candidate is dropped, never
    /// retried. The timeout aborts the in-flight request.
    pub async fn search_detail(&self, id: &str) -> Option<SearchDetail> {
        let url = format!("{}/searches/{}", self.base_url, id);
        let result = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .timeout(DETAIL_TIMEOUT)
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!(
                    "Detail fetch for search {} returned {}, dropping",
                    id,
                    response.status()
                );
                return None;
            }
            Err(e) => {
                tracing::debug!("Detail fetch for search {} failed: {}, dropping", id, e);
                return None;
            }
        };

        match response.json::<SearchDetail>().await {
            Ok(detail) => Some(detail),
            Err(e) => {
                tracing::debug!("Detail payload for search {} unreadable: {}", id, e);
                None
            }
        }
    }

    /// Single account enrichment, bounded at 800ms, returning a tagged
    /// outcome so the caller can tell a timeout from an upstream error.
    pub async fn single_enrich(&self, body: &AccountEnrichRequest) -> UpstreamOutcome {
        let url = format!("{}/enrichments/account", self.base_url);
        let result = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .timeout(ENRICH_TIMEOUT)
            .json(body)
            .send()
            .await;
        UpstreamOutcome::from_send(result).await
    }

    /// Extracts leads of one search (the upstream models this as a POST).
    pub async fn extract_leads(
        &self,
        search_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<Value, AppError> {
        self.post_json(
            "/leads/extract",
            &json!({
                "search_id": search_id,
                "page": page,
                "limit": limit
            }),
        )
        .await
    }
}
