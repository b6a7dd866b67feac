use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One search returned by the Pronto `/searches` listing. Only the id is
/// needed downstream; everything else is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelope of the Pronto `/searches` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchListing {
    #[serde(default)]
    pub searches: Vec<Candidate>,
}

/// Detail payload of one search. The upstream is inconsistent about the
/// field name: records arrive under `leads` or under `companies`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchDetail {
    pub leads: Option<Vec<LeadRecord>>,
    pub companies: Option<Vec<LeadRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchDetail {
    /// Returns whichever record list the upstream chose to populate.
    pub fn into_records(self) -> Vec<LeadRecord> {
        self.leads.or(self.companies).unwrap_or_default()
    }
}

/// One merged record from a search's detail payload.
///
/// The upstream schema is loose; the fields modelled explicitly are exactly
/// the ones the company-name fallback chain and the enrichment payload need.
/// Everything else passes through `extra` verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<LeadRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_linkedin_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Back-reference to the originating search; a tag, not a foreign key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrich: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub siret_result: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested company object as it appears inside a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Nested lead object as it appears inside a record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

impl LeadRecord {
    /// Derives the company name via the fixed fallback chain:
    /// `name` → `cleaned_name` → `company.name` → `lead.company.name` → `""`.
    /// Empty strings fall through to the next candidate.
    pub fn company_name(&self) -> String {
        non_empty(self.name.as_deref())
            .or_else(|| non_empty(self.cleaned_name.as_deref()))
            .or_else(|| non_empty(self.company.as_ref().and_then(|c| c.name.as_deref())))
            .or_else(|| {
                non_empty(
                    self.lead
                        .as_ref()
                        .and_then(|l| l.company.as_ref())
                        .and_then(|c| c.name.as_deref()),
                )
            })
            .unwrap_or_default()
            .to_string()
    }
}

/// Body of the Pronto account enrichment call, built from a record.
///
/// `domain` is sourced from `industry` before `domain`, mirroring the
/// mapping the service has always sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountEnrichRequest {
    pub company_linkedin_url: String,
    pub name: String,
    pub domain: String,
}

impl AccountEnrichRequest {
    pub fn from_record(record: &LeadRecord) -> Self {
        Self {
            company_linkedin_url: record
                .linkedin_url
                .clone()
                .or_else(|| record.company_linkedin_url.clone())
                .unwrap_or_default(),
            name: record.name.clone().unwrap_or_default(),
            domain: record
                .industry
                .clone()
                .or_else(|| record.domain.clone())
                .unwrap_or_default(),
        }
    }
}

/// Query parameters of the aggregation endpoint. Page values are kept as
/// raw strings so unparsable input falls back to page 1 instead of a 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlobalResultParams {
    pub page: Option<String>,
    pub paginate: Option<String>,
    #[serde(rename = "activitePrincipaleEtablissement")]
    pub activite_principale_etablissement: Option<String>,
}

/// Outward-facing envelope of the aggregation endpoint.
///
/// `total`, `totalPages` and `totalCompanies` are computed over the full
/// unpaginated merged list, never over the filtered subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResponse {
    pub page: Option<u32>,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    pub total: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
    #[serde(rename = "totalCompanies")]
    pub total_companies: usize,
    pub results: Vec<LeadRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn company_name_prefers_name() {
        let record: LeadRecord = serde_json::from_value(json!({
            "name": "Acme",
            "cleaned_name": "acme"
        }))
        .unwrap();
        assert_eq!(record.company_name(), "Acme");
    }

    #[test]
    fn company_name_falls_back_through_empty_strings() {
        let record: LeadRecord = serde_json::from_value(json!({
            "name": "",
            "cleaned_name": "",
            "company": { "name": "Acme SARL" }
        }))
        .unwrap();
        assert_eq!(record.company_name(), "Acme SARL");
    }

    #[test]
    fn company_name_reaches_nested_lead_company() {
        let record: LeadRecord = serde_json::from_value(json!({
            "lead": { "company": { "name": "Nested Corp" } }
        }))
        .unwrap();
        assert_eq!(record.company_name(), "Nested Corp");
    }

    #[test]
    fn company_name_defaults_to_empty() {
        let record = LeadRecord::default();
        assert_eq!(record.company_name(), "");
    }

    #[test]
    fn lead_record_preserves_unknown_fields() {
        let record: LeadRecord = serde_json::from_value(json!({
            "name": "Acme",
            "headcount": 42,
            "city": "Paris"
        }))
        .unwrap();
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["headcount"], 42);
        assert_eq!(back["city"], "Paris");
        // absent optionals stay absent in the serialized form
        assert!(back.get("enrich").is_none());
        assert!(back.get("siret_result").is_none());
    }

    #[test]
    fn detail_probes_leads_then_companies() {
        let detail: SearchDetail =
            serde_json::from_value(json!({ "companies": [{ "name": "A" }] })).unwrap();
        assert_eq!(detail.into_records().len(), 1);

        let detail: SearchDetail = serde_json::from_value(json!({ "id": "x" })).unwrap();
        assert!(detail.into_records().is_empty());
    }

    #[test]
    fn enrich_request_maps_industry_to_domain() {
        let record: LeadRecord = serde_json::from_value(json!({
            "name": "Acme",
            "industry": "Software",
            "domain": "acme.com"
        }))
        .unwrap();
        let body = AccountEnrichRequest::from_record(&record);
        assert_eq!(body.domain, "Software");
        assert_eq!(body.name, "Acme");
    }

    #[test]
    fn envelope_uses_compatible_field_names() {
        let envelope = AggregatedResponse {
            page: Some(2),
            page_size: 12,
            total: 30,
            total_pages: 3,
            total_companies: 30,
            results: vec![],
        };
        let v = serde_json::to_value(&envelope).unwrap();
        assert_eq!(v["pageSize"], 12);
        assert_eq!(v["totalPages"], 3);
        assert_eq!(v["totalCompanies"], 30);
    }
}
