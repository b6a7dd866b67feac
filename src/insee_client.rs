use crate::config::Config;
use crate::enrichment::UpstreamOutcome;
use crate::errors::{read_error_body, AppError};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Budget for one registry search issued from the enrichment stage.
pub const SEARCH_TIMEOUT: Duration = Duration::from_millis(800);

/// Client for the INSEE Sirene business registry.
///
/// The registry uses expiring bearer tokens: on a 401 the client obtains a
/// fresh token via client-credentials exchange and retries the call exactly
/// once. A second 401 propagates as a hard failure.
#[derive(Clone)]
pub struct InseeClient {
    client: Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    token: Arc<RwLock<String>>,
}

impl InseeClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.insee_base_url.clone(),
            token_url: config.insee_token_url.clone(),
            client_id: config.insee_client_id.clone(),
            client_secret: config.insee_client_secret.clone(),
            token: Arc::new(RwLock::new(
                config.insee_access_token.clone().unwrap_or_default(),
            )),
        }
    }

    /// Obtains a fresh bearer token via client-credentials exchange.
    pub async fn refresh_token(&self) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::from_upstream_response(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse token response: {}", e)))?;
        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AppError::Internal("Token response missing access_token".to_string())
            })?;

        *self.token.write().await = access_token.to_string();
        tracing::info!("INSEE access token refreshed");
        Ok(())
    }

    async fn raw_get(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Option<Duration>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let token = self.token.read().await.clone();
        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .query(query);
        if let Some(budget) = timeout {
            request = request.timeout(budget);
        }
        request.send().await
    }

    /// Authenticated GET with transparent re-authentication. Returns the raw
    /// upstream JSON; non-success (including a 401 surviving the refresh)
    /// surfaces the upstream status and body.
    pub async fn request(&self, path: &str, query: &[(String, String)]) -> Result<Value, AppError> {
        let mut response = self.raw_get(path, query, None).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.refresh_token().await?;
            response = self.raw_get(path, query, None).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                return Err(AppError::Upstream {
                    status: Some(StatusCode::UNAUTHORIZED.as_u16()),
                    body: read_error_body(response).await,
                });
            }
        }

        if !response.status().is_success() {
            return Err(AppError::from_upstream_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to parse INSEE response: {}", e)))
    }

    /// Full-text establishment search, bounded at 800ms, returning a tagged
    /// outcome. One transparent re-auth on 401, then the usual taxonomy:
    /// timeout is discarded upstream, any other failure is surfaced.
    pub async fn search_establishments(&self, q: &str) -> UpstreamOutcome {
        let query = vec![("q".to_string(), q.to_string())];
        let first = self.raw_get("/siret", &query, Some(SEARCH_TIMEOUT)).await;

        let result = match first {
            Ok(response) if response.status() == StatusCode::UNAUTHORIZED => {
                match self.refresh_token().await {
                    Ok(()) => self.raw_get("/siret", &query, Some(SEARCH_TIMEOUT)).await,
                    Err(e) => return UpstreamOutcome::Failed(Value::String(e.to_string())),
                }
            }
            other => other,
        };

        UpstreamOutcome::from_send(result).await
    }
}
