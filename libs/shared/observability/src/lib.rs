// [libs/shared/observability/src/lib.rs]
/*!
 * =================================================================
 * OBSERVABILITY INITIALIZATION
 * RESPONSIBILITY: tracing subscriber setup and panic capture
 *
 * Development: compact, colorized, local-time logs.
 * Production: flattened JSON events suitable for log aggregation.
 * Both modes install a panic hook that logs the panic location and
 * payload through `tracing` before the default hook runs, so a panic
 * in a background search worker is not lost to stderr alone.
 * =================================================================
 */

use std::panic;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global tracing subscriber for a named service.
///
/// Panics if a global subscriber has already been installed in this
/// process; call once, at the top of `main`.
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},tower_http=warn,hyper=warn,libsql=error",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .init();
    }

    let service = service_name.to_string();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");

        error!(target: "panic", service = %service, location = %location, "panic: {}", payload);
    }));

    info!("observability initialized for {}", service_name);
}
