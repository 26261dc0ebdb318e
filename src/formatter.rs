use serde_json::{Map, Value};

use crate::record::LogRecord;

/// Renders a record to text before it is buffered.
///
/// Called once per record per batch; implementations must not have side
/// effects.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

/// Default single-line layout.
pub const DEFAULT_LINE_FORMAT: &str = "[%datetime%] %channel%.%level_name%: %message% %context% %extra%\n";

/// Placeholder-based line formatter.
///
/// Recognised placeholders: `%datetime%`, `%channel%`, `%level_name%`,
/// `%level%`, `%message%`, `%context%`, `%extra%`. Context and extra are
/// rendered as JSON objects, `[]` when empty. The template is scanned
/// once, so substituted values are never expanded again; anything else
/// between `%` signs is kept as written.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    format: String,
    date_format: String,
}

impl LineFormatter {
    pub fn new(format: impl Into<String>) -> Self {
        LineFormatter {
            format: format.into(),
            date_format: "%Y-%m-%dT%H:%M:%S%.6f%:z".to_string(),
        }
    }

    /// Override the `chrono` format string used for `%datetime%`.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        LineFormatter::new(DEFAULT_LINE_FORMAT)
    }
}

fn render_map(map: &Map<String, Value>) -> String {
    if map.is_empty() {
        return "[]".to_string();
    }
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

impl LineFormatter {
    fn placeholder(&self, name: &str, record: &LogRecord) -> Option<String> {
        let value = match name {
            "datetime" => record.datetime.format(&self.date_format).to_string(),
            "channel" => record.channel.clone(),
            "level_name" => record.level.to_string(),
            "level" => record.level.0.to_string(),
            "message" => record.message.clone(),
            "context" => render_map(&record.context_data()),
            "extra" => render_map(&record.extra),
            _ => return None,
        };
        Some(value)
    }
}

impl Formatter for LineFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut line = String::with_capacity(self.format.len());
        let mut rest = self.format.as_str();
        while let Some(start) = rest.find('%') {
            line.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let expanded = after
                .find('%')
                .and_then(|end| Some((end, self.placeholder(&after[..end], record)?)));
            match expanded {
                Some((end, value)) => {
                    line.push_str(&value);
                    rest = &after[end + 1..];
                }
                None => {
                    line.push('%');
                    rest = after;
                }
            }
        }
        line.push_str(rest);
        line
    }
}
