// [apps/gateway/src/lib.rs]
//! Crate root. The binary targets (`gateway`, `migrator`, `seed`) all
//! depend on this library rather than duplicating module trees.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod kernel;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::kernel::GatewayKernel;
    pub use crate::state::{AppState, SystemMode};
}
