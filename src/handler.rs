use sentry_core::Hub;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::breadcrumbs::BreadcrumbBuffer;
use crate::config::HandlerConfig;
use crate::enricher::{EnricherCatalog, EnricherRegistry, ScopeEnricher};
use crate::error::{ConfigError, HandlerError};
use crate::event::event_from_record;
use crate::formatter::{Formatter, LineFormatter};
use crate::level::Level;
use crate::processor::RecordProcessor;
use crate::record::LogRecord;

/// Scope extra holding the formatted text of the main record.
pub const FORMATTED_EXTRA_KEY: &str = "monolog.formatted";

/// How long [`BreadcrumbHandler::handle_batch`] waits for the client to
/// drain after each captured event.
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Reduces batches of log records into one reported event each.
///
/// Every record of a batch that passes the level filter becomes a
/// breadcrumb; the most severe one becomes the event. Batches are handled
/// strictly one after another: [`handle_batch`](Self::handle_batch) takes
/// `&mut self`, so pipelines that need concurrency own one handler each.
pub struct BreadcrumbHandler {
    hub: Arc<Hub>,
    level: Level,
    bubble: bool,
    enrichers: EnricherRegistry,
    processors: Vec<Box<dyn RecordProcessor>>,
    formatter: Box<dyn Formatter>,
    breadcrumbs: BreadcrumbBuffer,
    flush_timeout: Duration,
}

impl BreadcrumbHandler {
    /// Handler reporting to `hub` with default settings: every level is
    /// handled, records bubble, no enrichers, [`LineFormatter`] output.
    ///
    /// A hub without a bound client accepts every batch and sends nothing.
    pub fn new(hub: Arc<Hub>) -> Self {
        BreadcrumbHandler {
            hub,
            level: Level::default(),
            bubble: true,
            enrichers: EnricherRegistry::default(),
            processors: Vec::new(),
            formatter: Box::new(LineFormatter::default()),
            breadcrumbs: BreadcrumbBuffer::new(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
        }
    }

    /// Build a handler from configuration.
    ///
    /// Enricher entries are resolved against `catalog` here, so a bad
    /// entry fails construction instead of a later batch.
    pub fn from_config(
        hub: Arc<Hub>,
        config: &HandlerConfig,
        catalog: &EnricherCatalog,
    ) -> Result<Self, ConfigError> {
        let enrichers = EnricherRegistry::from_config(&config.enrichers, catalog)?;
        Ok(Self::new(hub)
            .with_level(config.min_level)
            .with_bubble(config.bubble)
            .with_enrichers(enrichers))
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_bubble(mut self, bubble: bool) -> Self {
        self.bubble = bubble;
        self
    }

    pub fn with_enrichers(mut self, enrichers: EnricherRegistry) -> Self {
        self.enrichers = enrichers;
        self
    }

    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    pub fn push_enricher(&mut self, enricher: Arc<dyn ScopeEnricher>) {
        self.enrichers.push(enricher);
    }

    pub fn push_processor(&mut self, processor: impl RecordProcessor + 'static) {
        self.processors.push(Box::new(processor));
    }

    pub fn set_formatter(&mut self, formatter: impl Formatter + 'static) {
        self.formatter = Box::new(formatter);
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn bubble(&self) -> bool {
        self.bubble
    }

    /// Number of records currently buffered as breadcrumbs. Zero whenever
    /// no batch is in flight.
    pub fn buffered(&self) -> usize {
        self.breadcrumbs.len()
    }

    pub fn is_handling(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Handle a single record as a one-element batch.
    ///
    /// **Returns**
    /// - `Ok(true)` if the record was handled and must not bubble further.
    /// - `Ok(false)` if it was below the threshold or bubbling is enabled.
    pub fn handle(&mut self, record: LogRecord) -> Result<bool, HandlerError> {
        if !self.is_handling(record.level) {
            return Ok(false);
        }
        self.handle_batch(vec![record])?;
        Ok(!self.bubble)
    }

    /// Reduce one batch to at most one captured event.
    ///
    /// Records below the minimum level are dropped; if none remain nothing
    /// happens. Otherwise the most severe remaining record (earliest on
    /// ties) is picked as the main record, then every record is processed,
    /// formatted and buffered. The main record is captured inside a fresh
    /// scope carrying the whole buffer as breadcrumbs, and the hub's
    /// client is flushed. The buffer is empty again when this returns,
    /// even if an enricher panics.
    ///
    /// **Errors**
    /// - [`HandlerError::FlushTimeout`] if the client did not drain in
    ///   time. The event has been handed over by then.
    pub fn handle_batch(&mut self, records: Vec<LogRecord>) -> Result<(), HandlerError> {
        let BreadcrumbHandler {
            hub,
            level,
            enrichers,
            processors,
            formatter,
            breadcrumbs,
            flush_timeout,
            ..
        } = self;
        let hub: &Hub = hub;

        let total = records.len();
        let records: Vec<LogRecord> = records
            .into_iter()
            .filter(|record| record.level >= *level)
            .collect();
        let Some(main_index) = select_main(&records) else {
            trace!(total, min_level = %level, "no record of the batch reached the minimum level");
            return Ok(());
        };

        let mut buffer = breadcrumbs.batch();
        for mut record in records {
            for processor in processors.iter() {
                processor.process(&mut record);
            }
            record.formatted = Some(formatter.format(&record));
            buffer.accumulate(record);
        }

        let main = &buffer.records()[main_index];
        let event = event_from_record(main);
        let severity = event.level;
        let formatted = main.formatted.clone().unwrap_or_default();
        let trail = buffer.breadcrumbs();

        debug!(
            total,
            handled = buffer.len(),
            severity = ?severity,
            channel = %main.channel,
            "reporting log batch"
        );

        let event_id = hub.with_scope(
            |scope| {
                scope.set_level(Some(severity));
                scope.set_extra(FORMATTED_EXTRA_KEY, formatted.into());
            },
            || {
                hub.add_breadcrumb(trail);
                hub.configure_scope(|scope| enrichers.apply(scope, main, &event));
                hub.capture_event(event)
            },
        );
        if event_id.is_nil() {
            trace!("hub dropped the log batch event");
        }

        if let Some(client) = hub.client() {
            if !client.flush(Some(*flush_timeout)) {
                warn!(timeout = ?flush_timeout, "client did not flush after log batch");
                return Err(HandlerError::FlushTimeout(*flush_timeout));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for BreadcrumbHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BreadcrumbHandler")
            .field("level", &self.level)
            .field("bubble", &self.bubble)
            .field("enrichers", &self.enrichers)
            .field("processors", &self.processors.len())
            .field("buffered", &self.breadcrumbs.len())
            .finish()
    }
}

/// Index of the record with the strictly greatest level; the earliest
/// wins ties.
fn select_main(records: &[LogRecord]) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .fold(None, |highest: Option<(usize, Level)>, (index, record)| match highest {
            Some((_, level)) if record.level <= level => highest,
            _ => Some((index, record.level)),
        })
        .map(|(index, _)| index)
}
