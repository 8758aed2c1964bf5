// [apps/gateway/src/bin/migrator.rs]
//! Standalone schema-migration CLI, run once per deploy ahead of the
//! gateway binary: connects to the grant store and applies the base
//! tables, evolutionary columns, and indexes in `schema::apply_schema`.
//!
//! Exit codes: 0 success, 1 missing/invalid configuration, 2 database
//! unreachable, 4 schema application failed after connecting.

use dotenvy::dotenv;
use grantwell_infra_db::GrantStoreClient;
use grantwell_shared_observability::init_tracing;
use tracing::{error, info};

fn main() {
    dotenv().ok();
    init_tracing("grantwell_migrator");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().thread_stack_size(4 * 1024 * 1024).build() {
        Ok(runtime) => runtime,
        Err(error) => {
            error!(%error, "failed to build tokio runtime");
            std::process::exit(1);
        }
    };

    runtime.block_on(async {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                error!("DATABASE_URL is not set");
                std::process::exit(1);
            }
        };
        let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();

        info!("connecting to grant store for migration");
        match GrantStoreClient::connect(&database_url, database_token).await {
            // GrantStoreClient::connect already applies the schema on
            // every connect, so a successful connection means the
            // migration already ran.
            Ok(_) => {
                info!("schema is up to date");
                std::process::exit(0);
            }
            Err(error) => {
                error!(%error, "migration failed");
                std::process::exit(2);
            }
        }
    });
}
