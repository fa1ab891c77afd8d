//! Event types for the Pitchside event system
//!
//! Provides the editor event definitions and the EventBus shared by the rating
//! editor engine and its SSE surface.

use crate::types::{MemberId, RatingField, SaveStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Rating editor events
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EditorEvent {
    /// A rating was changed locally (not yet persisted)
    RatingEdited {
        member_id: MemberId,
        field: RatingField,
        value: u8,
        /// Composite derived from the effective ratings after the edit
        composite: Option<f64>,
        timestamp: DateTime<Utc>,
    },

    /// Save status of a member changed
    ///
    /// `status: None` means the previous status expired and the member is neutral again.
    SaveStatusChanged {
        member_id: MemberId,
        status: Option<SaveStatus>,
        timestamp: DateTime<Utc>,
    },

    /// Bulk apply run started over `total` selected members
    BulkApplyStarted {
        total: usize,
        skill: Option<u8>,
        physical: Option<u8>,
        timestamp: DateTime<Utc>,
    },

    /// One member of a bulk apply run was processed
    BulkApplyProgress {
        member_id: MemberId,
        /// 1-based position within the run
        position: usize,
        total: usize,
        skipped: bool,
    },

    /// Bulk apply run finished
    BulkApplyFinished {
        attempted: usize,
        skipped: usize,
        timestamp: DateTime<Utc>,
    },

    /// Canonical rating snapshot was re-fetched
    SnapshotRefreshed {
        records: usize,
        timestamp: DateTime<Utc>,
    },

    /// Bulk selection changed
    SelectionChanged { selected: usize },
}

impl EditorEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            EditorEvent::RatingEdited { .. } => "RatingEdited",
            EditorEvent::SaveStatusChanged { .. } => "SaveStatusChanged",
            EditorEvent::BulkApplyStarted { .. } => "BulkApplyStarted",
            EditorEvent::BulkApplyProgress { .. } => "BulkApplyProgress",
            EditorEvent::BulkApplyFinished { .. } => "BulkApplyFinished",
            EditorEvent::SnapshotRefreshed { .. } => "SnapshotRefreshed",
            EditorEvent::SelectionChanged { .. } => "SelectionChanged",
        }
    }
}

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use pitchside_common::events::{EditorEvent, EventBus};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(EditorEvent::SelectionChanged { selected: 3 });
/// assert_eq!(rx.try_recv().unwrap(), EditorEvent::SelectionChanged { selected: 3 });
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EditorEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: EditorEvent,
    ) -> Result<usize, broadcast::error::SendError<EditorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: EditorEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(10);
        assert!(bus.emit(EditorEvent::SelectionChanged { selected: 0 }).is_err());
        // Lossy variant must not panic
        bus.emit_lossy(EditorEvent::SelectionChanged { selected: 0 });
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let member_id = Uuid::new_v4();

        bus.emit_lossy(EditorEvent::SaveStatusChanged {
            member_id,
            status: Some(SaveStatus::Saving),
            timestamp: Utc::now(),
        });
        bus.emit_lossy(EditorEvent::SaveStatusChanged {
            member_id,
            status: Some(SaveStatus::Saved),
            timestamp: Utc::now(),
        });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(
            first,
            EditorEvent::SaveStatusChanged { status: Some(SaveStatus::Saving), .. }
        ));
        assert!(matches!(
            second,
            EditorEvent::SaveStatusChanged { status: Some(SaveStatus::Saved), .. }
        ));
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = EditorEvent::BulkApplyFinished {
            attempted: 3,
            skipped: 1,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "BulkApplyFinished");
        assert_eq!(json["attempted"], 3);
        assert_eq!(event.event_type(), "BulkApplyFinished");
    }
}
