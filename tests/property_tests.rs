/// Property-based tests for the pure pieces of the pipeline: page selection,
/// company-name derivation and the activity filter.
use proptest::prelude::*;
use prosperian_api::models::LeadRecord;
use prosperian_api::workflow::{matches_activity, select_page, PAGE_SIZE};
use serde_json::json;

fn records(n: usize) -> Vec<LeadRecord> {
    (0..n)
        .map(|i| serde_json::from_value(json!({ "name": format!("company-{}", i) })).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn select_page_never_panics(
        n in 0usize..100,
        paginate in proptest::option::of("\\PC{0,8}"),
        page in proptest::option::of("\\PC{0,8}"),
    ) {
        let all = records(n);
        let (resolved, selected) = select_page(&all, paginate.as_deref(), page.as_deref());
        match resolved {
            Some(p) => {
                prop_assert!(p >= 1);
                prop_assert!(selected.len() <= PAGE_SIZE);
            }
            None => {
                // neither parameter given: everything comes back
                prop_assert!(paginate.is_none() && page.is_none());
                prop_assert_eq!(selected.len(), n);
            }
        }
    }

    #[test]
    fn selected_page_is_exactly_the_requested_window(
        n in 0usize..200,
        p in 1u32..20,
    ) {
        let all = records(n);
        let raw = p.to_string();
        let (resolved, selected) = select_page(&all, Some(&raw), None);
        prop_assert_eq!(resolved, Some(p));

        let start = ((p as usize - 1) * PAGE_SIZE).min(n);
        let end = (p as usize * PAGE_SIZE).min(n);
        prop_assert_eq!(selected.len(), end - start);
        for (offset, record) in selected.iter().enumerate() {
            let expected = format!("company-{}", start + offset);
            prop_assert_eq!(record.name.as_deref(), Some(expected.as_str()));
        }
    }

    #[test]
    fn non_positive_and_junk_pages_resolve_to_one(
        n in 0usize..50,
        raw in "[a-z]{1,6}|0|-[0-9]{1,4}",
    ) {
        let all = records(n);
        let (resolved, selected) = select_page(&all, Some(&raw), None);
        prop_assert_eq!(resolved, Some(1));
        prop_assert_eq!(selected.len(), n.min(PAGE_SIZE));
    }

    #[test]
    fn company_name_follows_the_fallback_chain(
        name in "\\PC{0,12}",
        cleaned in "\\PC{0,12}",
        company in "\\PC{0,12}",
    ) {
        let record: LeadRecord = serde_json::from_value(json!({
            "name": name,
            "cleaned_name": cleaned,
            "company": { "name": company }
        })).unwrap();

        let expected = if !name.is_empty() {
            name.clone()
        } else if !cleaned.is_empty() {
            cleaned.clone()
        } else {
            company.clone()
        };
        prop_assert_eq!(record.company_name(), expected);
    }

    #[test]
    fn filter_never_panics_and_rejects_records_without_registry_data(
        code in "\\PC{0,8}",
    ) {
        prop_assert!(!matches_activity(&LeadRecord::default(), &code));

        let record: LeadRecord = serde_json::from_value(json!({
            "name": "Acme",
            "siret_result": { "error": { "message": "down" } }
        })).unwrap();
        prop_assert!(!matches_activity(&record, &code));
    }

    #[test]
    fn filter_only_matches_the_exact_active_code(
        active in "[0-9]{4}[A-Z]",
        requested in "[0-9]{4}[A-Z]",
    ) {
        let record: LeadRecord = serde_json::from_value(json!({
            "name": "Acme",
            "siret_result": {
                "etablissements": [{
                    "periodesEtablissement": [
                        { "dateFin": null, "activitePrincipaleEtablissement": active }
                    ]
                }]
            }
        })).unwrap();
        prop_assert_eq!(matches_activity(&record, &requested), active == requested);
    }
}
