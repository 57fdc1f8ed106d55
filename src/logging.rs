// 📝 Logging - tracing subscriber setup
// RUST_LOG controls the filter (default: info),
// e.g. RUST_LOG=material_insights=debug

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global subscriber for binaries
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Verbose subscriber for tests; safe to call more than once
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
