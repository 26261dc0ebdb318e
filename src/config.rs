use serde::Deserialize;
use serde_json::Value;

use crate::env::{
    env_or, BREADCRUMB_SINK_BUBBLE_ENV, BREADCRUMB_SINK_ENRICHERS_ENV, BREADCRUMB_SINK_MIN_LEVEL_ENV,
};
use crate::error::ConfigError;
use crate::level::Level;

/// Construction-time options of a [`BreadcrumbHandler`](crate::handler::BreadcrumbHandler).
///
/// **Fields**
/// - `min_level`: records below this level are ignored entirely.
/// - `bubble`: whether handled records should keep propagating to further
///   handlers; reported back by [`handle`](crate::handler::BreadcrumbHandler::handle).
/// - `enrichers`: ordered enricher entries, each naming an enricher of an
///   [`EnricherCatalog`](crate::enricher::EnricherCatalog). Anything but a
///   name is rejected when the handler is built.
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    #[serde(default)]
    pub min_level: Level,
    #[serde(default = "default_bubble")]
    pub bubble: bool,
    #[serde(default)]
    pub enrichers: Vec<Value>,
}

fn default_bubble() -> bool {
    true
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig {
            min_level: Level::default(),
            bubble: default_bubble(),
            enrichers: Vec::new(),
        }
    }
}

impl HandlerConfig {
    /// Build a config from `BREADCRUMB_SINK_*` environment variables,
    /// falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        let min_level: Level = env_or(BREADCRUMB_SINK_MIN_LEVEL_ENV, "debug").parse()?;
        let bubble = parse_bool(&env_or(BREADCRUMB_SINK_BUBBLE_ENV, "true"))?;
        let enrichers = parse_names(&env_or(BREADCRUMB_SINK_ENRICHERS_ENV, ""));
        Ok(HandlerConfig {
            min_level,
            bubble,
            enrichers,
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool(raw.to_string())),
    }
}

fn parse_names(raw: &str) -> Vec<Value> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Value::String(name.to_string()))
        .collect()
}
