//! Telemetry helpers for structured logging and tracing.

/// Initialize tracing. Users can install their own subscriber; this helper
/// loads a `.env` file if present, then installs a default env-filtered fmt
/// subscriber if none is set.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = dotenvy::dotenv();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
