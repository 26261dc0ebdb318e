use std::sync::atomic::Ordering;
use std::sync::Arc;

use breadcrumb_sink::handler::BreadcrumbHandler;
use breadcrumb_sink::layer::BreadcrumbLayer;
use breadcrumb_sink::level::Level;
use sentry_core::protocol::Level as Severity;
use sentry_core::test::TestTransport;
use sentry_core::{ClientOptions, Hub};
use serde_json::json;
use tokio::time::{sleep, Duration};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[derive(Debug, thiserror::Error)]
#[error("row lock timeout")]
struct LockTimeout;

fn test_hub() -> (Arc<Hub>, Arc<TestTransport>) {
    let transport = TestTransport::new();
    let options = ClientOptions {
        dsn: Some("https://public@sentry.invalid/1".parse().unwrap()),
        transport: Some(Arc::new(transport.clone())),
        ..Default::default()
    };
    let hub = Hub::new(Some(Arc::new(options.into())), Arc::new(Default::default()));
    (Arc::new(hub), transport)
}

#[tokio::test]
async fn events_in_one_interval_become_one_report() {
    let (hub, transport) = test_hub();
    let handler = BreadcrumbHandler::new(hub).with_level(Level::INFO);
    let (layer, _handle) = BreadcrumbLayer::new(handler, 64, 100, Duration::from_millis(50));
    let total = layer.total_events.clone();
    let enqueued = layer.enqueued_events.clone();

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("below threshold");
        tracing::info!(user_id = 42, "user signed in");
        let err = LockTimeout;
        tracing::error!(error = &err as &dyn std::error::Error, table = "orders", "update failed");
    });

    sleep(Duration::from_millis(300)).await;

    assert_eq!(total.load(Ordering::Relaxed), 3);
    assert_eq!(enqueued.load(Ordering::Relaxed), 2);

    let events = transport.fetch_and_clear_events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.message.as_deref(), Some("update failed"));
    assert_eq!(event.level, Severity::Error);
    assert_eq!(event.logger.as_deref(), Some("layer"));

    let exceptions = &event.exception.values;
    assert_eq!(exceptions.len(), 1);
    assert_eq!(exceptions[0].ty, "LockTimeout");
    assert_eq!(exceptions[0].value.as_deref(), Some("row lock timeout"));

    let crumbs = &event.breadcrumbs.values;
    assert_eq!(crumbs.len(), 2);
    assert_eq!(crumbs[0].message.as_deref(), Some("user signed in"));
    assert_eq!(crumbs[0].category.as_deref(), Some("layer"));
    assert_eq!(crumbs[0].data.get("user_id"), Some(&json!(42)));
    assert_eq!(crumbs[1].ty, "error");
    assert_eq!(crumbs[1].data.get("table"), Some(&json!("orders")));
    assert_eq!(crumbs[1].data.get("exception"), Some(&json!("row lock timeout")));
}

#[tokio::test]
async fn full_batches_are_handled_without_waiting() {
    let (hub, transport) = test_hub();
    let handler = BreadcrumbHandler::new(hub);
    let (layer, _handle) = BreadcrumbLayer::new(handler, 64, 2, Duration::from_secs(60));

    let subscriber = Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!("first");
        tracing::error!("second");
        tracing::info!("third");
        tracing::info!("fourth");
    });

    sleep(Duration::from_millis(300)).await;

    let events = transport.fetch_and_clear_events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].message.as_deref(), Some("second"));
    assert_eq!(events[1].message.as_deref(), Some("third"));
}

#[tokio::test]
async fn steady_trickle_is_reported_every_interval() {
    let (hub, transport) = test_hub();
    let handler = BreadcrumbHandler::new(hub);
    let (layer, _handle) = BreadcrumbLayer::new(handler, 64, 1000, Duration::from_millis(100));

    let _guard = tracing::subscriber::set_default(Registry::default().with(layer));
    tracing::error!("job stalled");
    for attempt in 0..8 {
        sleep(Duration::from_millis(40)).await;
        tracing::info!(attempt, "retrying job");
    }

    let events = transport.fetch_and_clear_events();
    assert!(!events.is_empty());
    assert_eq!(events[0].message.as_deref(), Some("job stalled"));
}
