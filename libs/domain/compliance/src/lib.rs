// [libs/domain/compliance/src/lib.rs]
/*!
 * COMPLIANCE AGENT
 * RESPONSIBILITY: rule-driven Layer-2 scoring (business-logic
 * alignment, feasibility, strategic synergy) plus hard-block rejection,
 * producing the final composite score for each research candidate.
 */

pub mod evaluator;
pub mod feasibility;
pub mod rules;
pub mod synergy;

pub use evaluator::{ComplianceAgent, EvaluationOutcome, RejectedCandidate, ScoredCandidate};
pub use feasibility::{feasibility, infer_project_duration_months};
pub use rules::{evaluate_business_logic_alignment, RuleEvaluation};
pub use synergy::{extract_keywords, strategic_synergy};
