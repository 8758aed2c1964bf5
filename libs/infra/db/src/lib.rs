// [libs/infra/db/src/lib.rs]
/*!
 * GRANT STORE
 * RESPONSIBILITY: libsql-backed persistence for the grant-discovery
 * pipeline's records: users, business profiles, grants, search runs,
 * applications, and the configuration documents the agents consult.
 */

pub mod client;
pub mod errors;
pub mod repositories;
pub mod schema;

pub use client::GrantStoreClient;
pub use errors::DbError;
