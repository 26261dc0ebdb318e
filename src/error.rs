use std::time::Duration;

/// Error raised while building a handler from configuration.
///
/// Always surfaces at construction time, never while a batch is handled.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("all scope enrichers must be enricher names, {type_name} given")]
    InvalidEnricher { type_name: &'static str },

    #[error("unknown scope enricher `{0}`")]
    UnknownEnricher(String),

    #[error("invalid log level `{0}`")]
    InvalidLevel(String),

    #[error("invalid boolean `{0}`")]
    InvalidBool(String),
}

/// Error returned by [`BreadcrumbHandler::handle_batch`](crate::handler::BreadcrumbHandler::handle_batch).
///
/// Capturing is fire-and-forget on a Sentry hub, so the only failure left
/// is a client that could not drain its transport in time. The handler
/// never retries.
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error("client did not flush within {0:?}")]
    FlushTimeout(Duration),
}

/// Error returned when installing the global `tracing` subscriber.
#[cfg(feature = "layer")]
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to install global subscriber: {0}")]
    SetGlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}
