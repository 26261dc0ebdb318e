//! Reduce batches of structured log records into single error-reporting
//! events.
//!
//! A [`BreadcrumbHandler`](handler::BreadcrumbHandler) takes a batch of
//! [`LogRecord`](record::LogRecord)s, keeps every record at or above its
//! minimum level as a breadcrumb, and captures the most severe one as a
//! Sentry event on a [`sentry_core::Hub`]. With the `layer`
//! feature, [`BreadcrumbLayer`](layer::BreadcrumbLayer) feeds the handler
//! from `tracing`.

pub mod level;
pub mod record;
pub mod event;
pub mod error;
pub mod config;
pub mod env;
pub mod formatter;
pub mod processor;
pub mod enricher;
pub mod breadcrumbs;
pub mod handler;

#[cfg(feature = "layer")]
pub mod layer;
#[cfg(feature = "layer")]
pub mod init;
