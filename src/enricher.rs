use sentry_core::protocol::Event;
use sentry_core::Scope;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::record::LogRecord;

/// Pluggable step that enriches the scope of a reported event.
///
/// Enrichers run after breadcrumbs were attached and right before the
/// event is captured. They may only mutate `scope`; `record` is the
/// batch's main record and `event` the event about to be captured.
pub trait ScopeEnricher: Send + Sync {
    fn process_scope(&self, scope: &mut Scope, record: &LogRecord, event: &Event<'static>);
}

/// Copies every context entry of the main record into the scope extras.
///
/// The exception entry is copied as its display text. Records without
/// context leave the scope untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextEnricher;

impl ScopeEnricher for ContextEnricher {
    fn process_scope(&self, scope: &mut Scope, record: &LogRecord, _event: &Event<'static>) {
        if !record.has_context() {
            return;
        }
        for (key, value) in record.context_data() {
            scope.set_extra(&key, value);
        }
    }
}

/// Tags the scope with the main record's channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelTagEnricher;

impl ScopeEnricher for ChannelTagEnricher {
    fn process_scope(&self, scope: &mut Scope, record: &LogRecord, _event: &Event<'static>) {
        if !record.channel.is_empty() {
            scope.set_tag("channel", &record.channel);
        }
    }
}

type EnricherFactory = Box<dyn Fn() -> Arc<dyn ScopeEnricher> + Send + Sync>;

/// Named enricher factories that configuration entries resolve against.
pub struct EnricherCatalog {
    factories: BTreeMap<String, EnricherFactory>,
}

impl EnricherCatalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        EnricherCatalog {
            factories: BTreeMap::new(),
        }
    }

    /// Catalog with the built-in enrichers: `context` and `channel`.
    pub fn with_builtins() -> Self {
        Self::empty()
            .register("context", || Arc::new(ContextEnricher))
            .register("channel", || Arc::new(ChannelTagEnricher))
    }

    /// Register (or replace) a factory under `name`.
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn ScopeEnricher> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    fn build(&self, name: &str) -> Option<Arc<dyn ScopeEnricher>> {
        self.factories.get(name).map(|factory| factory())
    }
}

impl Default for EnricherCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for EnricherCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Ordered list of scope enrichers, validated once at construction.
#[derive(Clone, Default)]
pub struct EnricherRegistry {
    enrichers: Vec<Arc<dyn ScopeEnricher>>,
}

impl EnricherRegistry {
    pub fn new(enrichers: Vec<Arc<dyn ScopeEnricher>>) -> Self {
        EnricherRegistry { enrichers }
    }

    /// Resolve configured entries against `catalog`, preserving order.
    ///
    /// Every entry must be a string naming a registered enricher. Fails on
    /// the first entry that is not, naming its JSON type.
    pub fn from_config(entries: &[Value], catalog: &EnricherCatalog) -> Result<Self, ConfigError> {
        let mut enrichers = Vec::with_capacity(entries.len());
        for entry in entries {
            let name = match entry {
                Value::String(name) => name,
                other => {
                    return Err(ConfigError::InvalidEnricher {
                        type_name: json_type_name(other),
                    })
                }
            };
            let enricher = catalog
                .build(name)
                .ok_or_else(|| ConfigError::UnknownEnricher(name.clone()))?;
            enrichers.push(enricher);
        }
        Ok(EnricherRegistry { enrichers })
    }

    pub fn push(&mut self, enricher: Arc<dyn ScopeEnricher>) {
        self.enrichers.push(enricher);
    }

    pub fn len(&self) -> usize {
        self.enrichers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enrichers.is_empty()
    }

    /// Run every enricher, in registration order, against the same scope.
    pub fn apply(&self, scope: &mut Scope, record: &LogRecord, event: &Event<'static>) {
        for enricher in &self.enrichers {
            enricher.process_scope(scope, record, event);
        }
    }
}

impl fmt::Debug for EnricherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnricherRegistry")
            .field("len", &self.enrichers.len())
            .finish()
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
