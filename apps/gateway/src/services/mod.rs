// [apps/gateway/src/services/mod.rs]
pub mod billing_rollover;
pub mod cleanup;
pub mod health_monitor;
pub mod notification_dispatcher;
pub mod rate_limit;
pub mod scheduler;
pub mod worker_pool;
