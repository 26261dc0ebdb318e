use sentry_core::protocol::{Breadcrumb, Event};
use std::time::SystemTime;

use crate::record::LogRecord;

/// Breadcrumb type of records below `ERROR`.
pub const BREADCRUMB_TYPE_DEFAULT: &str = "default";
/// Breadcrumb type of records at or above `ERROR`.
pub const BREADCRUMB_TYPE_ERROR: &str = "error";

/// Placeholder used for an empty breadcrumb category or message.
pub const NOT_AVAILABLE: &str = "N/A";

/// Build a breadcrumb from a buffered record.
///
/// `data` is the record's context merged with its extra map; extra
/// entries override context entries sharing a key.
pub fn breadcrumb_from_record(record: &LogRecord) -> Breadcrumb {
    let (level, ty) = record.level.to_breadcrumb();

    let mut crumb = Breadcrumb {
        timestamp: SystemTime::from(record.datetime),
        ty: ty.to_string(),
        category: Some(or_not_available(&record.channel)),
        level,
        message: Some(or_not_available(&record.message)),
        ..Default::default()
    };
    for (key, value) in record.context_data() {
        crumb.data.insert(key, value);
    }
    for (key, value) in &record.extra {
        crumb.data.insert(key.clone(), value.clone());
    }
    crumb
}

fn or_not_available(s: &str) -> String {
    if s.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        s.to_string()
    }
}

/// Build the event for a batch from its main record.
///
/// An exception on the record becomes the event's exception payload: one
/// value for the error itself, preceded by one per `source()` below it,
/// innermost first.
pub fn event_from_record(record: &LogRecord) -> Event<'static> {
    let exception = record
        .exception
        .as_ref()
        .map(|error| sentry_core::event_from_error(&**error).exception)
        .unwrap_or_default();

    Event {
        level: record.level.to_severity(),
        message: Some(record.message.clone()),
        logger: Some(record.channel.clone()),
        timestamp: SystemTime::from(record.datetime),
        exception,
        ..Default::default()
    }
}
