use serde::Deserialize;

const DEFAULT_PRONTO_BASE_URL: &str = "https://app.prontohq.com/api/v2";
const DEFAULT_INSEE_BASE_URL: &str = "https://api.insee.fr/entreprises/sirene/V3";
const DEFAULT_INSEE_TOKEN_URL: &str = "https://api.insee.fr/token";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub pronto_api_key: String,
    pub pronto_base_url: String,
    pub insee_base_url: String,
    pub insee_token_url: String,
    pub insee_client_id: String,
    pub insee_client_secret: String,
    /// Optional seed token. When absent the first registry call triggers a
    /// client-credentials exchange via the 401 path.
    pub insee_access_token: Option<String>,
}

fn checked_url(url: String, name: &str) -> anyhow::Result<String> {
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }
    Ok(url)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            pronto_api_key: std::env::var("PRONTO_API_KEY")
                .map_err(|_| anyhow::anyhow!("PRONTO_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("PRONTO_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            pronto_base_url: checked_url(
                std::env::var("PRONTO_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_PRONTO_BASE_URL.to_string()),
                "PRONTO_BASE_URL",
            )?,
            insee_base_url: checked_url(
                std::env::var("INSEE_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_INSEE_BASE_URL.to_string()),
                "INSEE_BASE_URL",
            )?,
            insee_token_url: checked_url(
                std::env::var("INSEE_TOKEN_URL")
                    .unwrap_or_else(|_| DEFAULT_INSEE_TOKEN_URL.to_string()),
                "INSEE_TOKEN_URL",
            )?,
            insee_client_id: std::env::var("INSEE_CLIENT_ID")
                .map_err(|_| anyhow::anyhow!("INSEE_CLIENT_ID environment variable required"))
                .and_then(|id| {
                    if id.trim().is_empty() {
                        anyhow::bail!("INSEE_CLIENT_ID cannot be empty");
                    }
                    Ok(id)
                })?,
            insee_client_secret: std::env::var("INSEE_CLIENT_SECRET")
                .map_err(|_| anyhow::anyhow!("INSEE_CLIENT_SECRET environment variable required"))
                .and_then(|secret| {
                    if secret.trim().is_empty() {
                        anyhow::bail!("INSEE_CLIENT_SECRET cannot be empty");
                    }
                    Ok(secret)
                })?,
            insee_access_token: std::env::var("INSEE_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Pronto base URL: {}", config.pronto_base_url);
        tracing::debug!("INSEE base URL: {}", config.insee_base_url);
        tracing::debug!("Server port: {}", config.port);

        Ok(config)
    }
}
