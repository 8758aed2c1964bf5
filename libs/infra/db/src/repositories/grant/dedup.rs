// [libs/infra/db/src/repositories/grant/dedup.rs]
//! Pure dedup-key normalization and field-wise merge logic. Kept free
//! of any I/O so the merge policy itself is unit-testable without a
//! database.

use grantwell_domain_models::Grant;

/// Strips a trailing slash, lowercases the host, and drops `utm_*`
/// query parameters so two URLs that differ only in tracking noise
/// collapse to the same key.
pub fn normalize_url(raw: &str) -> String {
    let mut url = raw.trim().to_string();

    if let Some(query_start) = url.find('?') {
        let (path, query) = url.split_at(query_start);
        let kept: Vec<&str> = query[1..]
            .split('&')
            .filter(|param| !param.starts_with("utm_"))
            .collect();
        url = if kept.is_empty() { path.to_string() } else { format!("{path}?{}", kept.join("&")) };
    }

    url = url.trim_end_matches('/').to_string();

    if let Some(scheme_end) = url.find("://") {
        let (scheme, rest) = url.split_at(scheme_end + 3);
        let host_end = rest.find('/').unwrap_or(rest.len());
        let (host, tail) = rest.split_at(host_end);
        url = format!("{scheme}{}{tail}", host.to_lowercase());
    }

    url
}

pub fn title_deadline_key(title: &str, deadline: Option<chrono::NaiveDate>) -> (String, Option<chrono::NaiveDate>) {
    (title.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase(), deadline)
}

/// Applies the field-wise "more informative value" merge policy: a
/// non-empty value beats empty, a longer free-text value beats a
/// shorter non-empty one, numeric bounds widen to their union, and
/// `first_found_at` is always preserved from the existing row while
/// `retrieved_at` always takes the incoming candidate's value.
pub fn merge(existing: &Grant, incoming: &Grant) -> Grant {
    let mut merged = existing.clone();

    merged.title = richer_text(&existing.title, &incoming.title);
    merged.description = richer_text(&existing.description, &incoming.description);
    merged.funder_name = richer_text(&existing.funder_name, &incoming.funder_name);

    if merged.sectors.is_empty() {
        merged.sectors = incoming.sectors.clone();
    }
    if merged.eligible_regions.is_empty() {
        merged.eligible_regions = incoming.eligible_regions.clone();
    }

    merged.funding.min_amount = widen_min(existing.funding.min_amount, incoming.funding.min_amount);
    merged.funding.max_amount = widen_max(existing.funding.max_amount, incoming.funding.max_amount);

    merged.deadline = incoming.deadline.or(existing.deadline);
    merged.status = incoming.status;

    for (key, value) in &incoming.raw_source_data {
        merged.raw_source_data.entry(key.clone()).or_insert_with(|| value.clone());
    }

    merged.first_found_at = existing.first_found_at;
    merged.retrieved_at = incoming.retrieved_at;
    merged.updated_at = incoming.updated_at;

    // Scores are recomputed by the compliance agent after merge, never
    // averaged across the two candidates.
    merged.score = None;
    merged.composite_score = None;

    merged
}

fn richer_text(existing: &str, incoming: &str) -> String {
    if existing.is_empty() {
        return incoming.to_string();
    }
    if incoming.is_empty() {
        return existing.to_string();
    }
    if incoming.len() > existing.len() {
        incoming.to_string()
    } else {
        existing.to_string()
    }
}

fn widen_min(existing: Option<f64>, incoming: Option<f64>) -> Option<f64> {
    match (existing, incoming) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn widen_max(existing: Option<f64>, incoming: Option<f64>) -> Option<f64> {
    match (existing, incoming) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_strips_trailing_slash_and_utm_params() {
        let a = normalize_url("https://Example.COM/grants/123/?utm_source=newsletter&ref=abc");
        let b = normalize_url("https://example.com/grants/123?ref=abc");
        assert_eq!(a, b);
    }

    #[test]
    fn normalize_url_lowercases_host_only() {
        let normalized = normalize_url("HTTPS://Example.COM/Grants/ABC");
        assert_eq!(normalized, "HTTPS://example.com/Grants/ABC");
    }

    #[test]
    fn title_deadline_key_is_case_and_whitespace_insensitive() {
        let a = title_deadline_key("  STEM   Grant  ", None);
        let b = title_deadline_key("stem grant", None);
        assert_eq!(a, b);
    }

    #[test]
    fn merge_widens_funding_bounds_to_union() {
        use grantwell_domain_models::grant::FundingBounds;
        let mut existing = sample_grant();
        existing.funding = FundingBounds { min_amount: Some(10_000.0), max_amount: Some(50_000.0) };
        let mut incoming = sample_grant();
        incoming.funding = FundingBounds { min_amount: Some(5_000.0), max_amount: Some(75_000.0) };

        let merged = merge(&existing, &incoming);
        assert_eq!(merged.funding.min_amount, Some(5_000.0));
        assert_eq!(merged.funding.max_amount, Some(75_000.0));
    }

    #[test]
    fn merge_preserves_first_found_at_from_existing() {
        let existing = sample_grant();
        let mut incoming = sample_grant();
        incoming.first_found_at = chrono::Utc::now();
        let merged = merge(&existing, &incoming);
        assert_eq!(merged.first_found_at, existing.first_found_at);
    }

    #[test]
    fn merge_prefers_longer_nonempty_description() {
        let mut existing = sample_grant();
        existing.description = "short".to_string();
        let mut incoming = sample_grant();
        incoming.description = "a much longer and more detailed description".to_string();
        let merged = merge(&existing, &incoming);
        assert_eq!(merged.description, incoming.description);
    }

    fn sample_grant() -> Grant {
        use grantwell_domain_models::grant::{FundingBounds, GeographicScope, RecordStatus};
        use std::collections::HashMap;
        use uuid::Uuid;

        Grant {
            id: Uuid::new_v4(),
            source_url: "https://example.com/g".to_string(),
            title: "Sample".to_string(),
            description: "".to_string(),
            funder_name: "".to_string(),
            sectors: vec![],
            funding: FundingBounds { min_amount: None, max_amount: None },
            deadline: None,
            geographic_scope: GeographicScope::National,
            eligible_regions: vec![],
            status: RecordStatus::Active,
            score: None,
            composite_score: None,
            raw_source_data: HashMap::new(),
            first_found_at: chrono::Utc::now(),
            retrieved_at: chrono::Utc::now(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }
}
