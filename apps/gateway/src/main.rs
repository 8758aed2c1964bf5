// [apps/gateway/src/main.rs]
//! Entry point: load `.env`, init tracing, read configuration, and
//! hand off to the kernel. The runtime is built manually rather than
//! via `#[tokio::main]` so the worker thread stack size can be raised
//! — the RAG generator's recursive section-assembly can run deep
//! enough on a default 2MB stack to warrant the extra headroom.

use dotenvy::dotenv;
use grantwell_gateway::kernel::GatewayKernel;
use grantwell_shared_observability::init_tracing;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("grantwell_gateway");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        let config = match grantwell_gateway::config::Config::from_env() {
            Ok(config) => config,
            Err(error) => {
                error!(%error, "invalid configuration, exiting");
                std::process::exit(1);
            }
        };

        info!("igniting gateway kernel");
        let kernel = GatewayKernel::ignite(config).await;
        kernel.launch().await;
    });

    Ok(())
}
