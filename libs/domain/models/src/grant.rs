// [libs/domain/models/src/grant.rs]
/*!
 * GRANT RECORD
 * RESPONSIBILITY: canonical shape for a discovered funding opportunity,
 * after dedup/upsert, independent of which provider surfaced it.
 *
 * Provider-specific fields that don't map onto a named column live in
 * `raw_source_data` rather than growing this struct per-provider.
 */

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Newly scored candidate awaiting an operator's first review.
    Draft,
    Active,
    Expired,
    Archived,
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FundingBounds {
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl FundingBounds {
    pub fn midpoint(&self) -> Option<f64> {
        match (self.min_amount, self.max_amount) {
            (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
            (Some(lo), None) => Some(lo),
            (None, Some(hi)) => Some(hi),
            (None, None) => None,
        }
    }
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GeographicScope {
    National,
    Regional,
    Local,
}

/// The six weighted sub-scores produced by the research and compliance
/// agents; combined into a composite by `grantwell_core_scoring`.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreVector {
    pub sector_relevance: f64,
    pub geographic_relevance: f64,
    pub operational_alignment: f64,
    pub business_logic_alignment: f64,
    pub feasibility: f64,
    pub strategic_synergy: f64,
}

impl ScoreVector {
    pub const ZERO: ScoreVector = ScoreVector {
        sector_relevance: 0.0,
        geographic_relevance: 0.0,
        operational_alignment: 0.0,
        business_logic_alignment: 0.0,
        feasibility: 0.0,
        strategic_synergy: 0.0,
    };

    /// Clamps every sub-score into `0.0..=1.0`; agents may overshoot when
    /// the model returns confident-but-unbounded values.
    pub fn clamped(self) -> ScoreVector {
        let c = |v: f64| v.clamp(0.0, 1.0);
        ScoreVector {
            sector_relevance: c(self.sector_relevance),
            geographic_relevance: c(self.geographic_relevance),
            operational_alignment: c(self.operational_alignment),
            business_logic_alignment: c(self.business_logic_alignment),
            feasibility: c(self.feasibility),
            strategic_synergy: c(self.strategic_synergy),
        }
    }
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    pub id: Uuid,
    pub source_url: String,
    pub title: String,
    pub description: String,
    pub funder_name: String,
    pub sectors: Vec<String>,
    pub funding: FundingBounds,
    pub deadline: Option<DateTime<Utc>>,
    pub geographic_scope: GeographicScope,
    pub eligible_regions: Vec<String>,
    pub status: RecordStatus,
    pub score: Option<ScoreVector>,
    pub composite_score: Option<f64>,
    /// Provider fields with no named column; never parsed back out into
    /// first-class fields at runtime, only surfaced verbatim to operators.
    pub raw_source_data: HashMap<String, Value>,
    /// First time any search run observed this grant, independent of
    /// subsequent re-discovery/refresh.
    pub first_found_at: DateTime<Utc>,
    pub retrieved_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grant {
    /// Exact-match dedup key per the URL-based strategy.
    pub fn dedup_key_by_url(&self) -> &str {
        self.source_url.trim_end_matches('/')
    }

    /// Title+deadline dedup key; deadline is floored to the day since
    /// providers disagree on the time-of-day component.
    pub fn dedup_key_by_title_deadline(&self) -> (String, Option<chrono::NaiveDate>) {
        (
            self.title.trim().to_lowercase(),
            self.deadline.map(|d| d.date_naive()),
        )
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, RecordStatus::Active | RecordStatus::Draft)
    }
}
