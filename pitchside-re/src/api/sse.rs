//! Server-Sent Events (SSE) broadcaster
//!
//! Streams editor events (edits, save status transitions, bulk progress) to
//! connected clients.

use crate::api::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    pitchside_common::sse::create_event_sse_stream(ctx.editor.events(), "pitchside-re")
}
