//! ABOUTME: Logging infrastructure and structured logging utilities
//! ABOUTME: Provides tracing initialization shared by every hierag binary/test harness

/// Initialize structured logging (env-filter driven, JSON off by default).
///
/// Safe to call more than once per process; subsequent calls are no-ops
/// because `tracing_subscriber::fmt().try_init()` refuses to replace an
/// already-installed global subscriber.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}