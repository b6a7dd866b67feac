//! Per-item enrichment stage.
//!
//! For each record of the page being returned, up to two further upstream
//! calls are made: an account enrichment (Pronto) and a registry lookup
//! (INSEE), each bounded by a strict per-call timeout and memoized for the
//! lifetime of one incoming request.

use crate::errors::read_error_body;
use crate::insee_client::InseeClient;
use crate::models::{AccountEnrichRequest, LeadRecord};
use crate::pronto_client::ProntoClient;
use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// Result of a bounded upstream call.
///
/// A timed-out call and an upstream error are deliberately distinct: the
/// caller discards timeouts silently but surfaces upstream errors.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamOutcome {
    Ok(Value),
    TimedOut,
    Failed(Value),
}

impl UpstreamOutcome {
    /// Classifies the result of a `send()` into the tagged outcome.
    pub async fn from_send(result: Result<reqwest::Response, reqwest::Error>) -> Self {
        match result {
            Ok(response) if response.status().is_success() => {
                match response.json::<Value>().await {
                    Ok(body) => UpstreamOutcome::Ok(body),
                    Err(e) if e.is_timeout() => UpstreamOutcome::TimedOut,
                    Err(e) => UpstreamOutcome::Failed(Value::String(e.to_string())),
                }
            }
            Ok(response) => UpstreamOutcome::Failed(read_error_body(response).await),
            Err(e) if e.is_timeout() => UpstreamOutcome::TimedOut,
            Err(e) => UpstreamOutcome::Failed(Value::String(e.to_string())),
        }
    }
}

/// Lookup tables scoped to one aggregation call, keyed by derived company
/// name. Constructed at request entry, dropped when the response is built;
/// never shared across requests.
#[derive(Debug, Default)]
pub struct RequestCaches {
    enrich: Mutex<HashMap<String, UpstreamOutcome>>,
    siret: Mutex<HashMap<String, UpstreamOutcome>>,
}

impl RequestCaches {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_enrich(&self, name: &str) -> Option<UpstreamOutcome> {
        self.enrich.lock().unwrap().get(name).cloned()
    }

    fn put_enrich(&self, name: &str, outcome: UpstreamOutcome) {
        self.enrich
            .lock()
            .unwrap()
            .insert(name.to_string(), outcome);
    }

    fn get_siret(&self, name: &str) -> Option<UpstreamOutcome> {
        self.siret.lock().unwrap().get(name).cloned()
    }

    fn put_siret(&self, name: &str, outcome: UpstreamOutcome) {
        self.siret.lock().unwrap().insert(name.to_string(), outcome);
    }
}

/// Attaches an outcome to a record field. Successful payloads attach as-is,
/// upstream errors attach wrapped under `error`, timeouts attach nothing.
fn attach_outcome(slot: &mut Option<Value>, outcome: UpstreamOutcome) {
    match outcome {
        UpstreamOutcome::Ok(body) => *slot = Some(body),
        UpstreamOutcome::Failed(body) => *slot = Some(json!({ "error": body })),
        UpstreamOutcome::TimedOut => {}
    }
}

async fn enrich_record(
    pronto: &ProntoClient,
    insee: &InseeClient,
    caches: &RequestCaches,
    mut record: LeadRecord,
) -> LeadRecord {
    let company_name = record.company_name();
    if company_name.is_empty() {
        return record;
    }

    let enrich = match caches.get_enrich(&company_name) {
        Some(outcome) => outcome,
        None => {
            let body = AccountEnrichRequest::from_record(&record);
            let outcome = pronto.single_enrich(&body).await;
            caches.put_enrich(&company_name, outcome.clone());
            outcome
        }
    };
    attach_outcome(&mut record.enrich, enrich);

    let siret = match caches.get_siret(&company_name) {
        Some(outcome) => outcome,
        None => {
            // Registry search expects the name quoted for an exact phrase match.
            let outcome = insee
                .search_establishments(&format!("\"{}\"", company_name))
                .await;
            caches.put_siret(&company_name, outcome.clone());
            outcome
        }
    };
    attach_outcome(&mut record.siret_result, siret);

    record
}

/// Runs the enrichment stage over one page of records.
///
/// One task per record, all dispatched concurrently; the stage completes
/// when every task has settled. Output order follows input order.
pub async fn enrich_page(
    pronto: &ProntoClient,
    insee: &InseeClient,
    caches: &RequestCaches,
    records: Vec<LeadRecord>,
) -> Vec<LeadRecord> {
    join_all(
        records
            .into_iter()
            .map(|record| enrich_record(pronto, insee, caches, record)),
    )
    .await
}
