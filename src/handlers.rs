use crate::config::Config;
use crate::errors::AppError;
use crate::insee_client::InseeClient;
use crate::pronto_client::ProntoClient;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the Pronto enrichment API.
    pub pronto: ProntoClient,
    /// Client for the INSEE Sirene registry.
    pub insee: InseeClient,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "prosperian-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /api/pronto/searches
pub async fn list_searches(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    state.pronto.get_json("/searches").await.map(Json)
}

/// GET /api/pronto/searches/:id
pub async fn search_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .pronto
        .get_json(&format!("/searches/{}", id))
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct SearchLeadsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// GET /api/pronto/searches/:id/leads
///
/// The upstream models lead extraction as a POST; this exposes it as a GET
/// for convenience, as the service always has.
pub async fn search_leads(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<SearchLeadsParams>,
) -> Result<Json<Value>, AppError> {
    state
        .pronto
        .extract_leads(&id, params.page.unwrap_or(1), params.limit.unwrap_or(100))
        .await
        .map(Json)
}

/// POST /api/pronto/accounts/single_enrich
pub async fn single_enrich(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    state
        .pronto
        .post_json("/enrichments/account", &body)
        .await
        .map(Json)
}

/// GET /api/siret — registry full-text establishment search. All query
/// parameters pass through to the upstream untouched.
pub async fn siret_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let query: Vec<(String, String)> = params.into_iter().collect();
    state.insee.request("/siret", &query).await.map(Json)
}

/// GET /api/insee/unitesLegales
pub async fn insee_unites_legales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let query: Vec<(String, String)> = params.into_iter().collect();
    state.insee.request("/unitesLegales", &query).await.map(Json)
}

/// GET /api/insee/siren/:siren
pub async fn insee_siren(
    State(state): State<Arc<AppState>>,
    Path(siren): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .insee
        .request(&format!("/siren/{}", siren), &[])
        .await
        .map(Json)
}

/// GET /api/insee/siret/:siret
pub async fn insee_siret(
    State(state): State<Arc<AppState>>,
    Path(siret): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .insee
        .request(&format!("/siret/{}", siret), &[])
        .await
        .map(Json)
}

#[derive(Debug, Deserialize)]
pub struct CombinedLookupParams {
    pub name: Option<String>,
    pub siren: Option<String>,
    pub naf: Option<String>,
}

/// GET /api/companies/combined
///
/// Combined Pronto + INSEE lookup: enrichment by SIREN or extraction by
/// name on the Pronto side, filtered legal-unit search on the registry
/// side, merged into one response.
pub async fn combined_lookup(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CombinedLookupParams>,
) -> Result<Json<Value>, AppError> {
    let pronto_data = if let Some(siren) = &params.siren {
        Some(
            state
                .pronto
                .post_json("/enrichments/account", &json!({ "siren": siren }))
                .await?,
        )
    } else if let Some(name) = &params.name {
        Some(
            state
                .pronto
                .post_json("/accounts/extract", &json!({ "name": name }))
                .await?,
        )
    } else {
        None
    };

    let mut filters: Vec<(String, String)> = Vec::new();
    if let Some(name) = &params.name {
        filters.push(("denominationUniteLegale".to_string(), name.clone()));
    }
    if let Some(siren) = &params.siren {
        filters.push(("siren".to_string(), siren.clone()));
    }
    if let Some(naf) = &params.naf {
        filters.push(("activitePrincipaleUniteLegale".to_string(), naf.clone()));
    }
    let insee_data = state.insee.request("/unitesLegales", &filters).await?;

    Ok(Json(json!({
        "pronto": pronto_data,
        "insee": insee_data.get("unitesLegales").cloned().unwrap_or(json!([]))
    })))
}
