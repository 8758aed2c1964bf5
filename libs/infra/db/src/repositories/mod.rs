// [libs/infra/db/src/repositories/mod.rs]
pub mod application;
pub mod configuration;
pub mod grant;
pub mod notification;
pub mod profile;
pub mod search_run;
pub mod user;

pub(crate) mod json_columns;
