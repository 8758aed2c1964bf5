// [libs/core/scoring/src/lib.rs]
/*!
 * SCORING ENGINE
 * RESPONSIBILITY: the pure-function math behind a grant's composite
 * score, and the string-similarity primitives the dedup pipeline and
 * strategic-synergy sub-score both depend on.
 *
 * Nothing in this crate performs I/O or touches `async`; every function
 * here takes owned or borrowed values and returns a value, which is
 * what makes the composite-score purity property checkable by a plain
 * unit test rather than an integration test.
 */

mod composite;
mod similarity;

pub use composite::{composite_score, CompositeWeights};
pub use similarity::{levenshtein_ratio, token_overlap};

use grantwell_domain_models::ScoreVector;

/// Evaluates whether two candidate grants are the same opportunity
/// under the fuzzy-title dedup strategy. The 0.85 threshold is a
/// tuned constant, not derived; see the dedup property tests.
pub const FUZZY_TITLE_THRESHOLD: f64 = 0.85;

pub fn is_fuzzy_title_match(a: &str, b: &str) -> bool {
    levenshtein_ratio(a, b) >= FUZZY_TITLE_THRESHOLD
}

/// Clamps a raw sub-score vector before it is fed into `composite_score`,
/// matching the "inputs outside [0,1] rejected upstream" boundary rule
/// at the call site that owns validation; this helper exists for callers
/// (tests, simulators) that want clamping without a full validation pass.
pub fn clamp_scores(v: ScoreVector) -> ScoreVector {
    v.clamped()
}
