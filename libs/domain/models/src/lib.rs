// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * DOMAIN MODELS
 * CLASSIFICATION: DOMAIN CORE
 * RESPONSIBILITY: canonical record shapes shared between the HTTP
 * layer, the agents, and the persistence layer.
 *
 * Every provider field that does not map onto a named column is
 * captured in `raw_source_data` rather than invented as a dedicated
 * struct field, per the re-architecture note on dynamic dataclass
 * grant objects: one canonical record, one typed blob for the rest.
 * =================================================================
 */

pub mod user;
pub mod profile;
pub mod grant;
pub mod analysis;
pub mod search_run;
pub mod application;
pub mod config;

pub use user::{SubscriptionTier, User};
pub use profile::BusinessProfile;
pub use grant::{FundingBounds, Grant, GeographicScope, RecordStatus, ScoreVector};
pub use analysis::Analysis;
pub use search_run::{RunError, RunStatus, SearchRun, TriggerType};
pub use application::{ApplicationHistory, ApplicationStatus, GeneratedApplication, GeneratedApplicationStatus};
pub use config::{ComplianceRule, GeographicConfig, GeographicTier, SectorConfig};
