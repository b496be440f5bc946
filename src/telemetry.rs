use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` takes precedence. Without it, debug mode raises this crate to
/// `debug` and everything else stays at `info`.
pub fn init(server: &ServerConfig) {
    let default_filter = if server.debug {
        "info,medchat_gateway=debug,tower_http=debug"
    } else {
        "info"
    };
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter_layer);

    if server.log_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .compact(),
            )
            .init();
    }
}
