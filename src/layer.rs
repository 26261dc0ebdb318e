use crate::handler::BreadcrumbHandler;
use crate::level::Level;
use crate::record::LogRecord;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Events emitted from inside this crate are never fed back into the
/// handler.
const SELF_TARGET: &str = "breadcrumb_sink";

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them, in batches, to a [`BreadcrumbHandler`].
///
/// Records travel over a bounded channel to a background task that owns
/// the handler. The task groups them into a batch and handles it on the
/// blocking pool once `batch_size` records arrived, or at the next tick of
/// a fixed `flush_interval` clock, whichever comes first. A steady trickle
/// of records is thus reported at least once per interval. Batches are
/// handled strictly one after another.
pub struct BreadcrumbLayer {
    sender: mpsc::Sender<LogRecord>,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl BreadcrumbLayer {
    /// Create a new layer and spawn the background task owning `handler`.
    ///
    /// Minimal thresholds are enforced for `buffer`, `batch_size` and
    /// `flush_interval` to avoid degenerate configurations. The task ends
    /// once the layer is dropped and the last batch was handled.
    pub fn new(
        handler: BreadcrumbHandler,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = flush_interval.max(Duration::from_millis(10));
        let min_level = handler.level();

        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);

        let total_events = Arc::new(AtomicU64::new(0));
        let enqueued_events = Arc::new(AtomicU64::new(0));
        let dropped_events = Arc::new(AtomicU64::new(0));

        let enqueued_events_bg = Arc::clone(&enqueued_events);

        let handle = tokio::spawn(async move {
            let mut handler = Some(handler);
            let mut batch = Vec::with_capacity(batch_size);
            let mut ticker = interval_at(Instant::now() + flush_interval, flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    maybe_record = rx.recv() => match maybe_record {
                        Some(record) => {
                            batch.push(record);
                            enqueued_events_bg.fetch_add(1, Ordering::Relaxed);
                            if batch.len() >= batch_size {
                                handler = handle_batch(handler, &mut batch).await;
                            }
                        }
                        None => {
                            handle_batch(handler, &mut batch).await;
                            break;
                        }
                    },
                    _ = ticker.tick() => {
                        if !batch.is_empty() {
                            handler = handle_batch(handler, &mut batch).await;
                        }
                    }
                }
            }
        });

        (Self {
            sender: tx,
            min_level,
            total_events,
            enqueued_events,
            dropped_events,
        }, handle)
    }
}

/// Hand the collected records to the handler on the blocking pool.
///
/// Gives the handler back for the next batch; `None` once it was lost to
/// a panic, after which batches are discarded.
async fn handle_batch(
    handler: Option<BreadcrumbHandler>,
    batch: &mut Vec<LogRecord>,
) -> Option<BreadcrumbHandler> {
    let records = std::mem::take(batch);
    let Some(mut handler) = handler else {
        eprintln!("breadcrumb handler unavailable, dropping {} log records", records.len());
        return None;
    };
    if records.is_empty() {
        return Some(handler);
    }

    let joined = tokio::task::spawn_blocking(move || {
        let result = handler.handle_batch(records);
        (handler, result)
    })
    .await;

    match joined {
        Ok((handler, Ok(()))) => Some(handler),
        Ok((handler, Err(e))) => {
            eprintln!("error reporting log batch: {}", e);
            Some(handler)
        }
        Err(e) => {
            eprintln!("breadcrumb handler panicked: {}", e);
            None
        }
    }
}

impl<S> Layer<S> for BreadcrumbLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if meta.target().starts_with(SELF_TARGET) {
            return;
        }
        let level = Level::from(meta.level());
        if level < self.min_level {
            return;
        }

        let mut record = LogRecord::new(level, meta.target(), "");
        let mut visitor = FieldVisitor { record: &mut record };
        event.record(&mut visitor);
        if let Some(module_path) = meta.module_path() {
            record.extra.insert("module_path".to_string(), Value::from(module_path));
        }
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record.extra.insert("location".to_string(), Value::from(format!("{}:{}", file, line)));
        }

        if let Err(_e) = self.sender.try_send(record) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("log channel full, dropping log record");
        }
    }
}

/// Collects an event's fields into a [`LogRecord`].
///
/// The `message` field becomes the record message, an error recorded
/// through [`Visit::record_error`] becomes its exception, everything else
/// lands in its context.
pub struct FieldVisitor<'a> {
    pub record: &'a mut LogRecord,
}

impl FieldVisitor<'_> {
    fn insert(&mut self, field: &Field, value: Value) {
        self.record.context.insert(field.name().to_string(), value);
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.record.message = value.to_string();
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if self.record.exception.is_none() {
            self.record.exception = Some(Arc::new(CapturedError::capture(value)));
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.record.message = format!("{:?}", value);
        } else {
            self.insert(field, Value::String(format!("{:?}", value)));
        }
    }
}

/// Owned copy of an error observed through `tracing`, keeping the display
/// and `Debug` text of the whole `source()` chain.
///
/// `Debug` reproduces the captured error's own output, so the exception
/// type Sentry derives from it names the captured type, not this wrapper.
pub struct CapturedError {
    message: String,
    debug: String,
    source: Option<Box<CapturedError>>,
}

impl CapturedError {
    pub fn capture(error: &(dyn Error + 'static)) -> Self {
        CapturedError {
            message: error.to_string(),
            debug: format!("{:?}", error),
            source: error.source().map(|source| Box::new(CapturedError::capture(source))),
        }
    }

    /// Type name of the captured error as Sentry reports it.
    pub fn type_name(&self) -> &str {
        sentry_core::parse_type_from_debug(&self.debug)
    }
}

impl fmt::Debug for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.debug)
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for CapturedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|source| source as &(dyn Error + 'static))
    }
}
