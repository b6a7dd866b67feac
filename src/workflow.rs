//! Multi-source aggregation workflow.
//!
//! `GET /api/prosperian/get/global/result` fetches the candidate searches,
//! fans out detail fetches, merges the resulting records into one ordered
//! list, paginates, enriches the selected page and applies the optional
//! activity-code filter.

use crate::enrichment::{enrich_page, RequestCaches};
use crate::errors::AppError;
use crate::handlers::AppState;
use crate::insee_client::InseeClient;
use crate::models::{AggregatedResponse, GlobalResultParams, LeadRecord};
use crate::pronto_client::ProntoClient;
use axum::{
    extract::{Query, State},
    Json,
};
use futures::future::join_all;
use std::sync::Arc;

pub const PAGE_SIZE: usize = 12;
/// Fixed cap on the number of candidate searches processed per request.
pub const MAX_CANDIDATES: usize = 10;

/// GET /api/prosperian/get/global/result
pub async fn global_result(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GlobalResultParams>,
) -> Result<Json<AggregatedResponse>, AppError> {
    tracing::info!("GET /get/global/result - params: {:?}", params);
    let response = run_global_result(&state.pronto, &state.insee, &params).await?;
    Ok(Json(response))
}

/// Runs the full aggregation pipeline. Split out of the handler so tests
/// can drive it against mock upstreams directly.
pub async fn run_global_result(
    pronto: &ProntoClient,
    insee: &InseeClient,
    params: &GlobalResultParams,
) -> Result<AggregatedResponse, AppError> {
    // 1. Candidate listing; any failure here is fatal to the whole request.
    let candidates = pronto.list_searches().await?;
    let ids: Vec<String> = candidates
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|c| c.id)
        .collect();
    tracing::debug!("Processing {} candidate searches", ids.len());

    // 2. Detail fetches in parallel; a failed or timed-out fetch yields None
    //    and that candidate's records are dropped.
    let details = join_all(ids.iter().map(|id| pronto.search_detail(id))).await;

    // 3. Flatten into one ordered list, tagging each record with its origin.
    let mut all_leads: Vec<LeadRecord> = Vec::new();
    for (id, detail) in ids.iter().zip(details) {
        if let Some(detail) = detail {
            for mut record in detail.into_records() {
                record.search_id = Some(id.clone());
                all_leads.push(record);
            }
        }
    }

    let total = all_leads.len();
    let total_pages = (total + PAGE_SIZE - 1) / PAGE_SIZE;

    // 4. Page selection: paginate wins over page; neither means everything.
    let (page, selected) = select_page(
        &all_leads,
        params.paginate.as_deref(),
        params.page.as_deref(),
    );

    // 5. Enrichment is paid only for the page being returned.
    let caches = RequestCaches::new();
    let mut results = enrich_page(pronto, insee, &caches, selected).await;

    if let Some(code) = params.activite_principale_etablissement.as_deref() {
        results.retain(|record| matches_activity(record, code));
    }

    Ok(AggregatedResponse {
        page,
        page_size: if page.is_some() { PAGE_SIZE } else { total },
        total,
        total_pages: if page.is_some() { total_pages } else { 1 },
        total_companies: total,
        results,
    })
}

/// Unparsable or non-positive page values fall back to page 1, matching the
/// behavior callers have always relied on.
fn parse_page(raw: &str) -> u32 {
    raw.trim().parse().ok().filter(|&p| p > 0).unwrap_or(1)
}

/// Selects the requested page out of the merged list.
///
/// `paginate` takes precedence over `page`; with neither present the whole
/// list is returned and the reported page is null. Out-of-range pages yield
/// an empty slice, not an error.
pub fn select_page(
    all: &[LeadRecord],
    paginate: Option<&str>,
    page: Option<&str>,
) -> (Option<u32>, Vec<LeadRecord>) {
    let requested = paginate.or(page).map(parse_page);
    match requested {
        Some(p) => {
            let start = ((p as usize - 1) * PAGE_SIZE).min(all.len());
            let end = (p as usize * PAGE_SIZE).min(all.len());
            (Some(p), all[start..end].to_vec())
        }
        None => (None, all.to_vec()),
    }
}

/// Fail-closed activity-code filter: a record passes only if its first
/// establishment has a currently active period (`dateFin == null`) whose
/// activity code equals the requested one exactly.
pub fn matches_activity(record: &LeadRecord, code: &str) -> bool {
    let etablissements = match record
        .siret_result
        .as_ref()
        .and_then(|v| v.get("etablissements"))
        .and_then(|v| v.as_array())
    {
        Some(list) if !list.is_empty() => list,
        _ => return false,
    };

    let periods = match etablissements[0]
        .get("periodesEtablissement")
        .and_then(|v| v.as_array())
    {
        Some(periods) => periods,
        None => return false,
    };

    periods
        .iter()
        .find(|p| p.get("dateFin").map(|d| d.is_null()).unwrap_or(false))
        .and_then(|p| p.get("activitePrincipaleEtablissement"))
        .and_then(|v| v.as_str())
        .map(|v| v == code)
        .unwrap_or(false)
}
