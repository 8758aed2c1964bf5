// [libs/domain/research/src/lib.rs]
/*!
 * RESEARCH AGENT
 * RESPONSIBILITY: turn a business profile into a deterministic search
 * plan, issue bounded-concurrency LLM queries against it, and produce
 * Layer-1-scored candidates for the compliance agent to evaluate.
 */

pub mod layer1;
pub mod orchestrator;
pub mod parsing;
pub mod plan;

pub use orchestrator::{mark_stale_if_old, ChunkFailure, EnrichedCandidate, ResearchAgent, RunOutcome, RunOutcomeStatus, STALE_AFTER_DAYS};
pub use parsing::{parse_candidates, parse_deadline, parse_funding, RawCandidate};
pub use plan::{build_search_plan, ChunkSpec, GeographicTier, MAX_CHUNKS_PER_PLAN};
