use std::error::Error;
use std::sync::Arc;

use breadcrumb_sink::enricher::{ChannelTagEnricher, ContextEnricher, EnricherRegistry, ScopeEnricher};
use breadcrumb_sink::handler::BreadcrumbHandler;
use breadcrumb_sink::level::Level;
use breadcrumb_sink::record::LogRecord;
use sentry_core::test::with_captured_events;
use sentry_core::Hub;

#[derive(Debug)]
struct UpstreamUnavailable;

impl std::fmt::Display for UpstreamUnavailable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("upstream unavailable")
    }
}

impl Error for UpstreamUnavailable {}

/// Hand one batch straight to the handler and print the event Sentry
/// would have sent.
fn main() -> Result<(), Box<dyn Error>> {
    let mut outcome = Ok(());
    let events = with_captured_events(|| {
        let enrichers: Vec<Arc<dyn ScopeEnricher>> = vec![Arc::new(ContextEnricher), Arc::new(ChannelTagEnricher)];
        let mut handler = BreadcrumbHandler::new(Hub::current())
            .with_level(Level::INFO)
            .with_enrichers(EnricherRegistry::new(enrichers));

        outcome = handler.handle_batch(vec![
            LogRecord::new(Level::DEBUG, "http", "parsed headers"),
            LogRecord::new(Level::INFO, "http", "GET /checkout").with_context("request_id", "r-17"),
            LogRecord::new(Level::ERROR, "payments", "charge failed")
                .with_context("amount", 1299)
                .with_exception(UpstreamUnavailable),
            LogRecord::new(Level::WARNING, "payments", "retry scheduled"),
        ]);
    });
    outcome?;

    for event in events {
        println!("{}", serde_json::to_string_pretty(&event)?);
    }
    Ok(())
}
