use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::error::Error;
use std::sync::Arc;

use crate::level::Level;

/// Shared error object attached to a record as its `exception` entry.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Key under which the exception entry appears when a record's context is
/// rendered as plain key/value data.
pub const EXCEPTION_KEY: &str = "exception";

/// One structured log entry as delivered by the logging pipeline.
///
/// `context` and `extra` keep insertion order. The distinguished
/// `context.exception` entry lives in [`LogRecord::exception`] so it keeps
/// its error identity instead of being flattened to JSON.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub datetime: DateTime<Utc>,
    pub level: Level,
    pub channel: String,
    pub message: String,
    pub context: Map<String, Value>,
    #[serde(skip)]
    pub exception: Option<SharedError>,
    pub extra: Map<String, Value>,
    /// Formatter output, attached before the record is buffered.
    pub formatted: Option<String>,
}

impl LogRecord {
    pub fn new(level: Level, channel: impl Into<String>, message: impl Into<String>) -> Self {
        LogRecord {
            datetime: Utc::now(),
            level,
            channel: channel.into(),
            message: message.into(),
            context: Map::new(),
            exception: None,
            extra: Map::new(),
            formatted: None,
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn with_exception<E>(mut self, error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.exception = Some(Arc::new(error));
        self
    }

    pub fn with_shared_exception(mut self, error: SharedError) -> Self {
        self.exception = Some(error);
        self
    }

    pub fn with_datetime(mut self, datetime: DateTime<Utc>) -> Self {
        self.datetime = datetime;
        self
    }

    /// Context entries as plain data, the exception entry (if any) rendered
    /// as its display text under [`EXCEPTION_KEY`].
    pub fn context_data(&self) -> Map<String, Value> {
        let mut data = self.context.clone();
        if let Some(exception) = &self.exception {
            data.insert(EXCEPTION_KEY.to_string(), Value::String(exception.to_string()));
        }
        data
    }

    /// `true` when the record carries no context entries at all.
    pub fn has_context(&self) -> bool {
        !self.context.is_empty() || self.exception.is_some()
    }
}
