//! Bulk apply over the selection
//!
//! Best-effort, not atomic: selected members are processed one at a time in
//! roster order, individual failures are counted and skipped, and members
//! already saved are never rolled back. A single busy flag rejects overlapping
//! runs. Each member's own debounce timer is canceled before its direct submit.

use super::scheduler::SaveRequest;
use super::{RatingEditor, Shared};
use crate::error::{Error, Result};
use pitchside_common::events::EditorEvent;
use pitchside_common::time;
use pitchside_common::{MemberId, RatingField, SaveStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Values to apply; a missing override keeps the member's current effective value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub skill: Option<u8>,
    #[serde(default)]
    pub physical: Option<u8>,
}

/// Aggregate result of a bulk run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    /// Members in the selection when the run started
    pub attempted: usize,
    /// Members not saved (off the roster, incomplete ratings or failed submit)
    pub skipped: usize,
}

impl BulkOutcome {
    pub fn saved(&self) -> usize {
        self.attempted - self.skipped
    }
}

/// Clears the busy flag however the run ends
struct BusyGuard(Arc<Shared>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.lock().bulk_running = false;
    }
}

impl RatingEditor {
    /// Apply overrides to every selected member
    ///
    /// Validation failures (empty selection, no override, out-of-bounds override)
    /// are returned before any submit is issued. The run itself is a detached
    /// task: dropping the returned future (e.g. a client disconnect) does not
    /// stop it half way, and every member still reaches a final status.
    pub async fn bulk_apply(&self, request: BulkRequest) -> Result<BulkOutcome> {
        let targets = self.begin_bulk(request)?;
        let busy = BusyGuard(self.shared.clone());

        let editor = self.clone();
        let run = tokio::spawn(async move {
            let outcome = editor.run_bulk(targets, request).await;
            drop(busy);
            outcome
        });

        run.await
            .map_err(|e| Error::Internal(format!("Bulk apply task failed: {}", e)))
    }

    /// Process the targets one at a time, then refresh the snapshot once
    async fn run_bulk(&self, targets: Vec<MemberId>, request: BulkRequest) -> BulkOutcome {
        let shared = &self.shared;
        let total = targets.len();
        shared.events.emit_lossy(EditorEvent::BulkApplyStarted {
            total,
            skill: request.skill,
            physical: request.physical,
            timestamp: time::now(),
        });
        info!(
            "Bulk apply started over {} members (skill={:?}, physical={:?})",
            total, request.skill, request.physical
        );

        let mut skipped = 0;
        for (position, member_id) in targets.into_iter().enumerate() {
            let saved = match self.prepare_bulk_member(member_id, request) {
                Some(save) => shared.submit(save).await,
                None => false,
            };
            if !saved {
                skipped += 1;
            }
            shared.events.emit_lossy(EditorEvent::BulkApplyProgress {
                member_id,
                position: position + 1,
                total,
                skipped: !saved,
            });
        }

        let outcome = BulkOutcome {
            attempted: total,
            skipped,
        };
        shared.events.emit_lossy(EditorEvent::BulkApplyFinished {
            attempted: outcome.attempted,
            skipped: outcome.skipped,
            timestamp: time::now(),
        });
        info!(
            "Bulk apply finished: {} attempted, {} skipped",
            outcome.attempted, outcome.skipped
        );

        if outcome.saved() > 0 && shared.settings.refresh_after_save {
            if let Err(e) = shared.refresh_snapshot().await {
                warn!("Snapshot refresh after bulk apply failed: {}", e);
            }
        }

        outcome
    }

    /// Validate the request, claim the busy flag and snapshot the targets
    fn begin_bulk(&self, request: BulkRequest) -> Result<Vec<MemberId>> {
        let shared = &self.shared;
        if request.skill.is_none() && request.physical.is_none() {
            return Err(Error::Validation(
                "bulk apply needs a skill or physical value".to_string(),
            ));
        }
        for (field, value) in [
            (RatingField::Skill, request.skill),
            (RatingField::Physical, request.physical),
        ] {
            let bounds = shared.settings.bounds(field);
            if let Some(value) = value {
                if !bounds.contains(value) {
                    return Err(Error::Validation(format!(
                        "{} rating {} outside {}..={}",
                        field, value, bounds.min, bounds.max
                    )));
                }
            }
        }

        let targets = self.selected();
        let mut state = shared.lock();
        if state.closed {
            return Err(Error::Closed);
        }
        if !shared.can_edit() {
            return Err(Error::NotPermitted);
        }
        if targets.is_empty() {
            return Err(Error::Validation("bulk apply needs a non-empty selection".to_string()));
        }
        if state.bulk_running {
            return Err(Error::BulkInProgress);
        }
        state.bulk_running = true;
        Ok(targets)
    }

    /// Cancel the member's debounce, resolve its values and mark it Saving
    ///
    /// `None` means the member is skipped (not on the roster, incomplete ratings
    /// or session closed).
    fn prepare_bulk_member(&self, member_id: MemberId, request: BulkRequest) -> Option<SaveRequest> {
        let shared = &self.shared;
        let mut state = shared.lock();
        if state.closed {
            warn!("Bulk apply: session closed, skipping {}", member_id);
            return None;
        }
        if !state.on_roster(&member_id) {
            warn!("Bulk apply: skipping {}: not on the roster", member_id);
            return None;
        }

        state.scheduler.cancel(&member_id);

        let effective = state.effective(&member_id);
        let skill = request.skill.or(effective.skill);
        let physical = request.physical.or(effective.physical);
        let (Some(skill), Some(physical)) = (skill, physical) else {
            warn!("Bulk apply: skipping {}: ratings incomplete", member_id);
            return None;
        };

        let revision = state.overlay.revision(&member_id);
        shared.set_status(&mut state, member_id, SaveStatus::Saving);
        Some(SaveRequest {
            member_id,
            skill,
            physical,
            revision,
        })
    }
}
