use crate::config::HandlerConfig;
use crate::enricher::EnricherCatalog;
use crate::error::InitError;
use crate::handler::BreadcrumbHandler;
use crate::layer::BreadcrumbLayer;
use sentry_core::Hub;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the [`BreadcrumbLayer`].
///
/// **Fields**
/// - `channel_buffer`: maximum number of records queued before new ones
///   are dropped.
/// - `batch_size`: records per batch handed to the handler.
/// - `flush_interval`: period of the clock on which an incomplete batch is
///   handled anyway. Records arriving within one tick share their
///   breadcrumb trail.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the breadcrumb layer.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            enable_stdout: true,
        }
    }
}

/// Initialize the global `tracing` subscriber reporting to `hub`.
///
/// **Parameters**
/// - `hub`: Sentry [`Hub`] receiving one event per batch; its bound client
///   decides where events go.
/// - `handler_config`: level threshold, bubble flag and enricher names;
///   enricher names resolve against [`EnricherCatalog::with_builtins`].
/// - `config`: [`LayerConfig`] controlling buffering and batching.
///
/// **Returns**
/// - The handle of the background task owning the handler.
/// - `Err(..)` if the enricher configuration is invalid or a global
///   subscriber was already installed.
///
/// Must be called from within a Tokio runtime.
pub fn init_tracing_with_config(
    hub: Arc<Hub>,
    handler_config: &HandlerConfig,
    config: LayerConfig,
) -> Result<JoinHandle<()>, InitError> {
    let handler = BreadcrumbHandler::from_config(hub, handler_config, &EnricherCatalog::with_builtins())?;
    let (layer, handle) = BreadcrumbLayer::new(
        handler,
        config.channel_buffer,
        config.batch_size,
        config.flush_interval,
    );

    // The two branches build different subscriber types.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// Initialize tracing with sensible defaults.
///
/// Equivalent to calling [`init_tracing_with_config`] with the handler
/// configuration read from the environment
/// ([`HandlerConfig::from_env`]) and [`LayerConfig::default`].
pub fn init_tracing(hub: Arc<Hub>) -> Result<JoinHandle<()>, InitError> {
    let handler_config = HandlerConfig::from_env()?;
    init_tracing_with_config(hub, &handler_config, LayerConfig::default())
}
