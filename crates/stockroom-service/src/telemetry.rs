//! Tracing subscriber setup for the binaries.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber. `RUST_LOG` wins over `level`; sqlx statement
/// logging is kept at warn unless asked for.
///
/// Returns false if a global subscriber was already set.
pub fn init_tracing(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// `level` applies to every target, ours included.
fn default_directives(level: &str) -> String {
    format!("{level},sqlx=warn")
}
