//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE implementation streaming EventBus traffic to connected UIs.

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

/// Create an SSE stream forwarding every editor event on `bus`
///
/// Each event is sent with its variant name as the SSE event type and its JSON
/// serialization as data. Lagged or undeliverable events are dropped with a warning.
///
/// # Example
/// ```rust,ignore
/// pub async fn event_stream(
///     State(ctx): State<AppContext>,
/// ) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
///     pitchside_common::sse::create_event_sse_stream(ctx.editor.events(), "pitchside-re")
/// }
/// ```
pub fn create_event_sse_stream(
    bus: &EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} editor events", service_name);

    let events = BroadcastStream::new(bus.subscribe()).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => {
                    debug!("SSE: sending {}", event.event_type());
                    Some(Ok(Event::default().event(event.event_type()).data(json)))
                }
                Err(e) => {
                    warn!("Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("ConnectionStatus").data("connected"));

        futures::pin_mut!(events);
        while let Some(item) = events.next().await {
            yield item;
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
