//! Debounced individual saves
//!
//! Every edit (re)arms the member's debounce timer, so a burst of edits
//! collapses into one submit carrying whatever the effective ratings are when
//! the timer finally fires. Members are independent: each has its own timer
//! and saves for different members may be in flight at the same time.

use super::timers::{TimerRegistry, TimerToken};
use super::{EditorState, Shared};
use pitchside_common::{MemberId, SaveStatus};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Per-member debounce timers
pub struct SaveScheduler {
    debounce: Duration,
    timers: TimerRegistry<MemberId>,
}

impl SaveScheduler {
    pub fn new(debounce: Duration, runtime: Handle) -> Self {
        Self {
            debounce,
            timers: TimerRegistry::new("debounce", runtime),
        }
    }

    /// Arm the member's timer, replacing any timer already armed for it
    pub fn schedule<F, Fut>(&mut self, member_id: MemberId, on_fire: F) -> TimerToken
    where
        F: FnOnce(TimerToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.timers.arm(member_id, self.debounce, on_fire)
    }

    pub fn cancel(&mut self, member_id: &MemberId) -> bool {
        self.timers.cancel(member_id)
    }

    /// Claim the member's fired timer (false if it was replaced or canceled)
    pub fn release(&mut self, member_id: &MemberId, token: TimerToken) -> bool {
        self.timers.release(member_id, token)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn cancel_all(&mut self) -> usize {
        self.timers.cancel_all()
    }
}

/// Values captured when a save is issued
#[derive(Debug, Clone, Copy)]
pub(super) struct SaveRequest {
    pub member_id: MemberId,
    pub skill: u8,
    pub physical: u8,
    /// Revision of the pending edit the values came from (None: canonical only)
    pub revision: Option<u64>,
}

impl Shared {
    /// (Re)arm the member's debounced save
    pub(super) fn schedule_save(self: &Arc<Self>, state: &mut EditorState, member_id: MemberId) {
        let weak: Weak<Shared> = Arc::downgrade(self);
        state.scheduler.schedule(member_id, move |token| async move {
            if let Some(shared) = weak.upgrade() {
                shared.run_debounced_save(member_id, token).await;
            }
        });
    }

    /// Debounce timer fired: persist the latest effective values
    async fn run_debounced_save(self: Arc<Self>, member_id: MemberId, token: TimerToken) {
        let request = {
            let mut state = self.lock();
            if state.closed || !state.scheduler.release(&member_id, token) {
                return;
            }

            let Some((skill, physical)) = state.effective(&member_id).complete() else {
                // Partial input is never persisted
                debug!("Save for {} skipped: ratings incomplete", member_id);
                return;
            };

            if !self.can_edit() {
                warn!("Save for {} skipped: edit capability revoked", member_id);
                return;
            }

            let revision = state.overlay.revision(&member_id);
            self.set_status(&mut state, member_id, SaveStatus::Saving);
            SaveRequest {
                member_id,
                skill,
                physical,
                revision,
            }
        };

        let succeeded = self.submit(request).await;
        if succeeded && self.settings.refresh_after_save {
            if let Err(e) = self.refresh_snapshot().await {
                warn!("Snapshot refresh after saving {} failed: {}", member_id, e);
            }
        }
    }

    /// Issue one submit call and record its outcome
    ///
    /// Shared by the debounced path and bulk apply. Returns whether the call
    /// succeeded.
    pub(super) async fn submit(self: &Arc<Self>, request: SaveRequest) -> bool {
        let SaveRequest {
            member_id,
            skill,
            physical,
            revision,
        } = request;

        let result = self.ports.submitter.submit(member_id, skill, physical).await;

        let mut state = self.lock();
        if state.closed {
            warn!(
                "Save result for {} arrived after teardown ({})",
                member_id,
                if result.is_ok() { "ok" } else { "failed" }
            );
        }

        match result {
            Ok(()) => {
                // A newer edit made while in flight keeps its own pending save
                let cleared = state.overlay.clear_if_revision(&member_id, revision);
                info!(
                    "Saved ratings for {}: skill={} physical={}{}",
                    member_id,
                    skill,
                    physical,
                    if cleared || revision.is_none() { "" } else { " (newer edit pending)" }
                );
                self.set_status(&mut state, member_id, SaveStatus::Saved);
                true
            }
            Err(e) => {
                // Unsaved edits are kept for a later retry
                warn!("Failed to save ratings for {}: {}", member_id, e);
                self.set_status(&mut state, member_id, SaveStatus::Failed);
                false
            }
        }
    }
}
