use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// The driver is chatty at info; keep it at warn unless RUST_LOG says otherwise.
const DEFAULT_FILTER: &str = "info,mongodb=warn";

pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
