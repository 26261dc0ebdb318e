/// Environment variable names used by this crate for convenient
/// configuration of the handler from services.
///
/// These are purely helpers; the handler itself never reads the
/// environment.

/// Minimum level a record needs to be handled, e.g. `warning` or `300`.
pub const BREADCRUMB_SINK_MIN_LEVEL_ENV: &str = "BREADCRUMB_SINK_MIN_LEVEL";

/// Whether handled records keep bubbling to further handlers.
pub const BREADCRUMB_SINK_BUBBLE_ENV: &str = "BREADCRUMB_SINK_BUBBLE";

/// Comma-separated list of enricher names, e.g. `context,channel`.
pub const BREADCRUMB_SINK_ENRICHERS_ENV: &str = "BREADCRUMB_SINK_ENRICHERS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
