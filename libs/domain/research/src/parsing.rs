// [libs/domain/research/src/parsing.rs]
//! Tolerant parsing of an LLM chunk response. The system prompt fixes a
//! JSON schema, but providers occasionally wrap it in prose or emit
//! near-miss JSON; a regex-fallback line parser recovers what it can
//! rather than discarding the whole chunk on a malformed response.

use chrono::{DateTime, NaiveDate, Utc};
use grantwell_domain_models::FundingBounds;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use typeshare::typeshare;

#[typeshare]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCandidate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source_url: Option<String>,
    pub deadline: Option<String>,
    pub funding: Option<String>,
    pub eligibility: Option<String>,
    pub source_name: Option<String>,
}

impl RawCandidate {
    /// A candidate survives only with a title AND at least one of
    /// source_url or deadline; everything else can be enriched later.
    pub fn is_admissible(&self) -> bool {
        let has_title = self.title.as_deref().is_some_and(|t| !t.trim().is_empty());
        let has_anchor = self.source_url.as_deref().is_some_and(|u| !u.trim().is_empty())
            || self.deadline.as_deref().is_some_and(|d| !d.trim().is_empty());
        has_title && has_anchor
    }
}

#[derive(Deserialize)]
struct StrictArray(Vec<RawCandidate>);

/// Parses one chunk's raw LLM text into admissible candidates. Tries
/// strict JSON first (array or `{"grants": [...]}` wrapper), then falls
/// back to the labeled-line heuristic parser, then drops what neither
/// parser could make sense of.
pub fn parse_candidates(text: &str) -> Vec<RawCandidate> {
    if let Some(candidates) = try_strict_json(text) {
        return candidates.into_iter().filter(RawCandidate::is_admissible).collect();
    }
    fallback_parse(text).into_iter().filter(RawCandidate::is_admissible).collect()
}

fn try_strict_json(text: &str) -> Option<Vec<RawCandidate>> {
    let trimmed = extract_json_span(text)?;
    if let Ok(StrictArray(candidates)) = serde_json::from_str::<StrictArray>(trimmed) {
        return Some(candidates);
    }
    #[derive(Deserialize)]
    struct Wrapper {
        grants: Vec<RawCandidate>,
    }
    serde_json::from_str::<Wrapper>(trimmed).ok().map(|w| w.grants)
}

/// Some providers wrap the JSON array in prose ("Here are the grants:
/// [...]"); slice from the first `[` to the matching last `]` before
/// attempting strict parse.
fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find(['[', '{'])?;
    let end = text.rfind([']', '}'])?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

fn labeled_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*(title|description|source[_ ]?url|deadline|funding|amount|eligibility|source[_ ]?name)\s*[:=]\s*(.+)$").unwrap()
    })
}

/// Heuristic parser for non-JSON output: groups consecutive
/// `label: value` lines into one candidate per blank-line-delimited
/// block, tolerating whichever subset of fields the model produced.
fn fallback_parse(text: &str) -> Vec<RawCandidate> {
    let re = labeled_line_regex();
    let mut candidates = Vec::new();
    let mut current = RawCandidate::default();
    let mut has_any_field = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            if has_any_field {
                candidates.push(std::mem::take(&mut current));
                has_any_field = false;
            }
            continue;
        }
        if let Some(caps) = re.captures(line) {
            let label = caps[1].to_lowercase().replace([' ', '_'], "");
            let value = caps[2].trim().to_string();
            has_any_field = true;
            match label.as_str() {
                "title" => current.title = Some(value),
                "description" => current.description = Some(value),
                "sourceurl" => current.source_url = Some(value),
                "deadline" => current.deadline = Some(value),
                "funding" | "amount" => current.funding = Some(value),
                "eligibility" => current.eligibility = Some(value),
                "sourcename" => current.source_name = Some(value),
                _ => {}
            }
        }
    }
    if has_any_field {
        candidates.push(current);
    }
    candidates
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// Best-effort deadline parse; a handful of RFC3339/plain-date formats
/// and two prose formats cover what providers actually send. Anything
/// else is dropped rather than guessed at.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc));
        }
    }
    None
}

fn funding_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$?\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s*([kKmM])?").unwrap())
}

/// Extracts a low/high funding bound from free text such as
/// `"$10,000 - $50,000"` or `"up to $2M"`. A single figure is treated
/// as both bounds; no figure yields an unbounded `FundingBounds`.
pub fn parse_funding(raw: &str) -> FundingBounds {
    let amounts: Vec<f64> = funding_number_regex()
        .captures_iter(raw)
        .filter_map(|caps| {
            let digits: String = caps[1].chars().filter(|c| *c != ',').collect();
            let base: f64 = digits.parse().ok()?;
            let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
                Some(m) if m == "k" => 1_000.0,
                Some(m) if m == "m" => 1_000_000.0,
                _ => 1.0,
            };
            Some(base * multiplier)
        })
        .collect();

    match amounts.as_slice() {
        [] => FundingBounds { min_amount: None, max_amount: None },
        [single] => FundingBounds { min_amount: Some(*single), max_amount: Some(*single) },
        values => {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            FundingBounds { min_amount: Some(min), max_amount: Some(max) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_json_array() {
        let text = r#"[{"title":"Rural Broadband Fund","source_url":"https://example.gov/rbf","description":"x"}]"#;
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title.as_deref(), Some("Rural Broadband Fund"));
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let text = r#"Here are the grants I found: [{"title":"AI Grant","deadline":"2026-09-01"}] Let me know if you need more."#;
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn parses_wrapper_object_with_grants_key() {
        let text = r#"{"grants":[{"title":"Green Energy Fund","source_url":"https://example.org/g"}]}"#;
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn falls_back_to_labeled_lines_on_malformed_json() {
        let text = "Title: STEM Innovation Grant\nDescription: supports early-stage STEM ventures\nSource URL: https://example.com/stem\n\nTitle: incomplete entry with no anchor\n";
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title.as_deref(), Some("STEM Innovation Grant"));
    }

    #[test]
    fn rejects_candidates_missing_title_or_anchor() {
        let text = r#"[{"description":"no title here","source_url":"https://example.com"}]"#;
        assert!(parse_candidates(text).is_empty());
    }

    #[test]
    fn empty_response_yields_no_candidates() {
        assert!(parse_candidates("").is_empty());
        assert!(parse_candidates("I could not find any matching grants.").is_empty());
    }

    #[test]
    fn parses_iso_and_plain_dates() {
        assert!(parse_deadline("2026-09-01T00:00:00Z").is_some());
        assert!(parse_deadline("2026-09-01").is_some());
        assert!(parse_deadline("09/01/2026").is_some());
        assert!(parse_deadline("not a date").is_none());
    }

    #[test]
    fn parses_funding_range() {
        let bounds = parse_funding("Awards range from $10,000 to $50,000");
        assert_eq!(bounds.min_amount, Some(10_000.0));
        assert_eq!(bounds.max_amount, Some(50_000.0));
    }

    #[test]
    fn parses_funding_with_k_and_m_suffixes() {
        let bounds = parse_funding("up to $2M per award, minimum $500k");
        assert_eq!(bounds.max_amount, Some(2_000_000.0));
        assert_eq!(bounds.min_amount, Some(500_000.0));
    }

    #[test]
    fn no_figure_yields_unbounded_funding() {
        let bounds = parse_funding("Funding amount not specified");
        assert_eq!(bounds.min_amount, None);
        assert_eq!(bounds.max_amount, None);
    }
}
