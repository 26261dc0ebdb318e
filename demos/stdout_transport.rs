use std::error::Error;
use std::sync::Arc;

use breadcrumb_sink::init::init_tracing;
use sentry_core::{ClientOptions, Envelope, Hub, Transport};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Example of plugging a custom transport under the hub. Imagine this
/// talks to some proprietary error tracker; here it just prints what it
/// would send.
struct StdoutTransport;

impl Transport for StdoutTransport {
    fn send_envelope(&self, envelope: Envelope) {
        let Some(event) = envelope.event() else {
            return;
        };
        println!(
            "[stdout-transport] {:?} {}",
            event.level,
            event.message.as_deref().unwrap_or_default()
        );
        for crumb in &event.breadcrumbs.values {
            println!(
                "[stdout-transport]   {} {:?}: {}",
                crumb.category.as_deref().unwrap_or_default(),
                crumb.level,
                crumb.message.as_deref().unwrap_or_default()
            );
        }
    }

    fn flush(&self, _timeout: std::time::Duration) -> bool {
        println!("[stdout-transport] flushed");
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let options = ClientOptions {
        dsn: Some("https://public@errors.example.invalid/1".parse()?),
        transport: Some(Arc::new(Arc::new(StdoutTransport))),
        ..Default::default()
    };
    let hub = Hub::new(Some(Arc::new(options.into())), Arc::new(Default::default()));
    init_tracing(Arc::new(hub))?;

    info!("custom transport example started");
    error!(db = "orders", "simulated error reported through a custom transport");

    // Give the background task time to handle the batch.
    sleep(Duration::from_secs(2)).await;
    Ok(())
}
