use serde_json::{Map, Value};

use crate::record::LogRecord;

/// Mutates a record before it is formatted and buffered.
///
/// Processors run in registration order over every record that passed the
/// level filter, the batch's main record included.
pub trait RecordProcessor: Send + Sync {
    fn process(&self, record: &mut LogRecord);
}

impl<F> RecordProcessor for F
where
    F: Fn(&mut LogRecord) + Send + Sync,
{
    fn process(&self, record: &mut LogRecord) {
        self(record)
    }
}

/// Adds a fixed set of key/values to every record's `extra` map.
///
/// Existing keys on the record are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ExtraFieldsProcessor {
    fields: Map<String, Value>,
}

impl ExtraFieldsProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

impl RecordProcessor for ExtraFieldsProcessor {
    fn process(&self, record: &mut LogRecord) {
        for (key, value) in &self.fields {
            if !record.extra.contains_key(key) {
                record.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use serde_json::json;

    #[test]
    fn extra_fields_do_not_override_record() {
        let processor = ExtraFieldsProcessor::new()
            .with_field("service", "billing")
            .with_field("region", "eu");

        let mut record = LogRecord::new(Level::INFO, "app", "hi").with_extra("region", "us");
        processor.process(&mut record);

        assert_eq!(record.extra.get("service"), Some(&json!("billing")));
        assert_eq!(record.extra.get("region"), Some(&json!("us")));
    }

    #[test]
    fn closures_are_processors() {
        let upper = |record: &mut LogRecord| record.message = record.message.to_uppercase();
        let mut record = LogRecord::new(Level::INFO, "app", "quiet");
        upper.process(&mut record);
        assert_eq!(record.message, "QUIET");
    }
}
