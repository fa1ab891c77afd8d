//! Shared fixtures for rating editor integration tests

#![allow(dead_code)]

use pitchside_common::config::EditorSettings;
use pitchside_common::events::EditorEvent;
use pitchside_common::{MemberId, SaveStatus};
use pitchside_re::backend::{EditorPorts, InMemoryBackend, StaticGate};
use pitchside_re::editor::WeightedMean;
use pitchside_re::model::{RatingRecord, RosterMember};
use pitchside_re::RatingEditor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Editor wired to an in-memory backend
pub struct Fixture {
    pub editor: RatingEditor,
    pub backend: Arc<InMemoryBackend>,
    pub gate: Arc<StaticGate>,
    pub members: Vec<RosterMember>,
}

impl Fixture {
    /// Id of the roster member with this name
    pub fn id(&self, name: &str) -> MemberId {
        self.members
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.id)
            .unwrap_or_else(|| panic!("no member named {}", name))
    }

    /// (member, skill, physical) of every submit call in arrival order
    pub fn submitted(&self) -> Vec<(MemberId, u8, u8)> {
        self.backend
            .submissions()
            .into_iter()
            .map(|s| (s.member_id, s.skill_rating, s.physical_rating))
            .collect()
    }
}

pub fn member(name: &str, position: &str) -> RosterMember {
    RosterMember {
        id: Uuid::new_v4(),
        name: name.to_string(),
        nickname: None,
        position: position.to_string(),
        monthly_payer: false,
    }
}

pub fn rated(member_id: MemberId, skill: Option<u8>, physical: Option<u8>) -> RatingRecord {
    RatingRecord {
        skill_rating: skill,
        physical_rating: physical,
        ..RatingRecord::unrated(member_id)
    }
}

pub async fn fixture(members: Vec<RosterMember>, ratings: Vec<RatingRecord>) -> Fixture {
    fixture_with(
        InMemoryBackend::new(members.clone(), ratings),
        members,
        EditorSettings::default(),
    )
    .await
}

pub async fn fixture_with(
    backend: InMemoryBackend,
    members: Vec<RosterMember>,
    settings: EditorSettings,
) -> Fixture {
    let backend = Arc::new(backend);
    let gate = Arc::new(StaticGate::new(true));
    let editor = RatingEditor::new(
        EditorPorts::from_backend(backend.clone()),
        gate.clone(),
        Arc::new(WeightedMean::default()),
        settings,
    )
    .expect("editor");
    editor.load().await.expect("load");

    Fixture {
        editor,
        backend,
        gate,
        members,
    }
}

pub async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Everything currently buffered on the receiver
pub fn drain(rx: &mut broadcast::Receiver<EditorEvent>) -> Vec<EditorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Status transitions of one member, in order
pub fn status_trail(events: &[EditorEvent], member_id: MemberId) -> Vec<Option<SaveStatus>> {
    events
        .iter()
        .filter_map(|e| match e {
            EditorEvent::SaveStatusChanged {
                member_id: id,
                status,
                ..
            } if *id == member_id => Some(*status),
            _ => None,
        })
        .collect()
}
