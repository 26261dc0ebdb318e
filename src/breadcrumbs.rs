use sentry_core::protocol::Breadcrumb;
use std::ops::{Deref, DerefMut};

use crate::event::breadcrumb_from_record;
use crate::record::LogRecord;

/// Ordered buffer of the records seen while handling one batch.
///
/// Records are kept as records (processed and formatted) and only turned
/// into [`Breadcrumb`]s when the scope of the reported event is filled.
#[derive(Debug, Default)]
pub struct BreadcrumbBuffer {
    records: Vec<LogRecord>,
}

impl BreadcrumbBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, record: LogRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// One breadcrumb per buffered record, oldest first.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.records.iter().map(breadcrumb_from_record).collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the buffer for one batch; it is cleared when the guard drops.
    pub fn batch(&mut self) -> BatchGuard<'_> {
        BatchGuard { buffer: self }
    }
}

/// Exclusive borrow of a [`BreadcrumbBuffer`] that clears it on drop.
pub struct BatchGuard<'a> {
    buffer: &'a mut BreadcrumbBuffer,
}

impl Deref for BatchGuard<'_> {
    type Target = BreadcrumbBuffer;

    fn deref(&self) -> &BreadcrumbBuffer {
        &*self.buffer
    }
}

impl DerefMut for BatchGuard<'_> {
    fn deref_mut(&mut self) -> &mut BreadcrumbBuffer {
        &mut *self.buffer
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.buffer.clear();
    }
}
