use tracing_subscriber::{fmt, EnvFilter};

/// Initializes tracing/logging based on environment variables.
/// Set NLGATE_LOG_JSON=1 for structured JSON output.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if std::env::var("NLGATE_LOG_JSON").is_ok() {
        fmt().with_env_filter(env_filter).json().init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }
}
