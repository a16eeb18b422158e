/// Tracing subscriber setup
///
/// `RUST_LOG` selects what is logged; without it the Warbler crates and the
/// HTTP trace layer log at debug level. [`LogFormat::Json`] switches to one
/// JSON object per event for log aggregation.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "warbler_api=debug,warbler_shared=debug,tower_http=debug";

/// Installs the global subscriber
///
/// Call once, before anything logs.
pub fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init(),
    }
}
