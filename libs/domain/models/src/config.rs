// [libs/domain/models/src/config.rs]
//! Configuration documents: operator-maintained reference data consulted
//! by the research and compliance agents. Stored like any other record
//! but versioned rather than mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorConfig {
    pub id: Uuid,
    pub sector_key: String,
    pub display_name: String,
    pub keywords: Vec<String>,
    pub related_sectors: Vec<String>,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GeographicTier {
    National,
    State,
    County,
    City,
}

#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeographicConfig {
    pub id: Uuid,
    pub region_key: String,
    pub display_name: String,
    pub tier: GeographicTier,
    pub parent_region_key: Option<String>,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

/// A single rule evaluated by the compliance agent against a candidate's
/// (title + description + keywords) text. `include_keywords` that fail to
/// match subtract `penalty` from `business_logic_alignment`; any
/// `exclude_keywords` match subtracts `hard_reject_penalty` instead. A
/// rule with `hard_block = true` whose excludes match additionally marks
/// the grant REJECT, dropping it from the run rather than scoring it.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceRule {
    pub id: Uuid,
    pub rule_key: String,
    pub description: String,
    pub hard_block: bool,
    pub applies_to_sectors: Vec<String>,
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub penalty: f64,
    pub hard_reject_penalty: f64,
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

impl ComplianceRule {
    pub const DEFAULT_PENALTY: f64 = 0.2;
    pub const DEFAULT_HARD_REJECT_PENALTY: f64 = 0.5;

    pub fn applies_to(&self, sectors: &[String]) -> bool {
        self.applies_to_sectors.is_empty()
            || sectors
                .iter()
                .any(|s| self.applies_to_sectors.iter().any(|a| a.eq_ignore_ascii_case(s)))
    }
}
