//! Rating editor session
//!
//! One editing session over the roster of the active scope. Holds the canonical
//! rating snapshot, the overlay of unsaved edits, per-member save statuses, the
//! bulk selection and every timer the session has armed. All state lives behind
//! a single mutex that is never held across an await point: mutations happen
//! synchronously inside the calling handler, timer callback or response
//! continuation.
//!
//! Components:
//! - [`overlay`]: pending edits and the `overlay ?? canonical` resolver
//! - [`composite`]: pluggable composite policy
//! - [`status`]: save status with auto-expiry
//! - [`scheduler`]: per-member debounce and the individual save path
//! - [`pipeline`]: deterministic filtering/sorting of the merged view
//! - [`selection`]: bulk targets
//! - [`bulk`]: sequential best-effort bulk apply

pub mod bulk;
pub mod composite;
pub mod overlay;
pub mod pipeline;
pub mod scheduler;
pub mod selection;
pub mod status;
pub mod timers;

pub use bulk::{BulkOutcome, BulkRequest};
pub use composite::{CompositePolicy, WeightedMean};
pub use overlay::{EditOverlay, EffectiveRatings, PendingEdit};
pub use pipeline::{MemberView, PositionFilter, SortKey, ViewFilter};
pub use scheduler::SaveScheduler;
pub use selection::SelectionSet;
pub use status::StatusTracker;

use crate::backend::{CapabilityGate, EditorPorts};
use crate::error::{Error, Result};
use crate::model::{AuditEntry, RatingRecord, RosterMember};
use composite::resolve_composite;
use pitchside_common::config::EditorSettings;
use pitchside_common::events::{EditorEvent, EventBus};
use pitchside_common::time;
use pitchside_common::{MemberId, RatingField, SaveStatus};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Result of a single-field edit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EditOutcome {
    /// Edit merged into the overlay and a save scheduled
    Applied { composite: Option<f64> },
    /// Actor lacks edit capability (or the session is closed); nothing changed
    Ignored,
}

/// Overlay-aware counters for dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditorSummary {
    pub members: usize,
    /// Members whose effective ratings are both defined
    pub rated: usize,
    /// Members without a canonical skill rating
    pub missing_rating: usize,
    pub unsaved: usize,
    pub selected: usize,
    pub bulk_running: bool,
}

/// Live timers, for diagnostics and teardown checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerCounts {
    pub debounce: usize,
    pub expiry: usize,
}

/// Mutable session state, guarded by `Shared::state`
struct EditorState {
    roster: Vec<RosterMember>,
    roster_index: HashMap<MemberId, usize>,
    canonical: HashMap<MemberId, RatingRecord>,
    overlay: EditOverlay,
    status: StatusTracker,
    scheduler: SaveScheduler,
    selection: SelectionSet,
    bulk_running: bool,
    closed: bool,
}

impl EditorState {
    fn effective(&self, member_id: &MemberId) -> EffectiveRatings {
        overlay::effective_ratings(self.overlay.get(member_id), self.canonical.get(member_id))
    }

    fn replace_roster(&mut self, roster: Vec<RosterMember>) {
        self.roster_index = roster
            .iter()
            .enumerate()
            .map(|(index, member)| (member.id, index))
            .collect();
        self.roster = roster;

        let index = &self.roster_index;
        let dropped = self.selection.retain(|id| index.contains_key(id));
        if dropped > 0 {
            debug!("Dropped {} selected ids no longer on the roster", dropped);
        }
    }

    fn on_roster(&self, member_id: &MemberId) -> bool {
        self.roster_index.contains_key(member_id)
    }

    fn replace_snapshot(&mut self, records: Vec<RatingRecord>) {
        self.canonical = records.into_iter().map(|r| (r.member_id, r)).collect();
    }

    fn view(&self, index: usize, policy: &dyn CompositePolicy) -> MemberView {
        let member = &self.roster[index];
        let canonical = self.canonical.get(&member.id);
        let effective = self.effective(&member.id);
        MemberView {
            member_id: member.id,
            roster_index: index,
            name: member.name.clone(),
            nickname: member.nickname.clone(),
            position: pipeline::normalize_position(&member.position),
            monthly_payer: member.monthly_payer,
            skill: effective.skill,
            physical: effective.physical,
            composite: resolve_composite(policy, effective.skill, effective.physical),
            canonical_skill: canonical.and_then(|c| c.skill_rating),
            canonical_physical: canonical.and_then(|c| c.physical_rating),
            canonical_composite: canonical.and_then(|c| c.composite_rating),
            last_updated_at: canonical.and_then(|c| c.last_updated_at),
            last_updated_by_name: canonical.and_then(|c| c.last_updated_by_name.clone()),
            dirty: self.overlay.is_dirty(&member.id),
            status: self.status.get(&member.id),
            selected: self.selection.contains(&member.id),
        }
    }
}

/// Everything shared between the editor handle and its timer/save tasks
struct Shared {
    state: Mutex<EditorState>,
    ports: EditorPorts,
    gate: Arc<dyn CapabilityGate>,
    policy: Arc<dyn CompositePolicy>,
    settings: EditorSettings,
    events: EventBus,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn can_edit(&self) -> bool {
        self.gate.can_edit()
    }

    /// Set a member's status, (re)arming or stopping its expiry timer
    ///
    /// No-op once the session is closed, so nothing is armed after teardown.
    fn set_status(self: &Arc<Self>, state: &mut EditorState, member_id: MemberId, status: SaveStatus) {
        if state.closed {
            debug!("Session closed, not recording {} for {}", status, member_id);
            return;
        }

        let ttl = match status {
            SaveStatus::Saving => None,
            SaveStatus::Saved => Some(self.settings.saved_ttl()),
            SaveStatus::Failed => Some(self.settings.failed_ttl()),
        };
        let weak: Weak<Shared> = Arc::downgrade(self);
        state.status.set(member_id, status, ttl, move |token| async move {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let expired = shared.lock().status.expire(&member_id, token);
            if expired {
                debug!("Save status expired for {}", member_id);
                shared.events.emit_lossy(EditorEvent::SaveStatusChanged {
                    member_id,
                    status: None,
                    timestamp: time::now(),
                });
            }
        });

        self.events.emit_lossy(EditorEvent::SaveStatusChanged {
            member_id,
            status: Some(status),
            timestamp: time::now(),
        });
    }

    /// Re-fetch the canonical snapshot and replace it wholesale
    async fn refresh_snapshot(&self) -> Result<usize> {
        let records = self.ports.ratings.ratings().await?;
        let count = records.len();
        {
            let mut state = self.lock();
            if state.closed {
                debug!("Session closed, dropping refreshed snapshot");
                return Err(Error::Closed);
            }
            state.replace_snapshot(records);
        }
        self.events.emit_lossy(EditorEvent::SnapshotRefreshed {
            records: count,
            timestamp: time::now(),
        });
        debug!("Canonical snapshot refreshed: {} records", count);
        Ok(count)
    }
}

/// Handle to one editing session
///
/// Cheap to clone; every clone drives the same session. Dropping the last
/// handle cancels all timers still armed.
#[derive(Clone)]
pub struct RatingEditor {
    shared: Arc<Shared>,
}

impl RatingEditor {
    /// Create an empty session
    ///
    /// Must be called from within a tokio runtime; timers are spawned on it.
    pub fn new(
        ports: EditorPorts,
        gate: Arc<dyn CapabilityGate>,
        policy: Arc<dyn CompositePolicy>,
        settings: EditorSettings,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Config(format!("Rating editor requires a tokio runtime: {}", e)))?;
        let events = EventBus::new(settings.event_capacity);
        let state = EditorState {
            roster: Vec::new(),
            roster_index: HashMap::new(),
            canonical: HashMap::new(),
            overlay: EditOverlay::new(),
            status: StatusTracker::new(runtime.clone()),
            scheduler: SaveScheduler::new(settings.debounce(), runtime),
            selection: SelectionSet::new(),
            bulk_running: false,
            closed: false,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                ports,
                gate,
                policy,
                settings,
                events,
            }),
        })
    }

    /// Fetch roster and canonical snapshot from the external sources
    pub async fn load(&self) -> Result<()> {
        let roster = self.shared.ports.roster.roster().await?;
        let records = self.shared.ports.ratings.ratings().await?;
        let (members, count) = (roster.len(), records.len());
        {
            let mut state = self.shared.lock();
            if state.closed {
                return Err(Error::Closed);
            }
            state.replace_roster(roster);
            state.replace_snapshot(records);
        }
        info!("Loaded {} roster members and {} rating records", members, count);
        Ok(())
    }

    /// Re-fetch the canonical rating snapshot; the overlay is kept
    pub async fn refresh(&self) -> Result<usize> {
        self.shared.refresh_snapshot().await
    }

    /// Edit one rating of one member
    ///
    /// Out-of-bounds values are rejected without touching any state. Without edit
    /// capability the call is a no-op. Otherwise the value is merged into the
    /// member's pending edit and the member's debounced save is (re)armed.
    pub fn set_rating(&self, member_id: MemberId, field: RatingField, value: u8) -> Result<EditOutcome> {
        let bounds = self.shared.settings.bounds(field);
        if !bounds.contains(value) {
            warn!(
                "Rejected {} = {} for {}: outside {}..={}",
                field, value, member_id, bounds.min, bounds.max
            );
            return Err(Error::Validation(format!(
                "{} rating {} outside {}..={}",
                field, value, bounds.min, bounds.max
            )));
        }

        if !self.shared.can_edit() {
            debug!("Edit of {} ignored: no edit capability", member_id);
            return Ok(EditOutcome::Ignored);
        }

        let composite = {
            let mut state = self.shared.lock();
            if state.closed {
                debug!("Edit of {} ignored: session closed", member_id);
                return Ok(EditOutcome::Ignored);
            }
            if !state.on_roster(&member_id) {
                return Err(Error::UnknownMember(member_id));
            }

            state.overlay.set(member_id, field, value);
            let effective = state.effective(&member_id);
            let composite =
                resolve_composite(self.shared.policy.as_ref(), effective.skill, effective.physical);
            self.shared.schedule_save(&mut state, member_id);
            composite
        };

        self.shared.events.emit_lossy(EditorEvent::RatingEdited {
            member_id,
            field,
            value,
            composite,
            timestamp: time::now(),
        });
        Ok(EditOutcome::Applied { composite })
    }

    /// Re-arm the debounced save for a member with unsaved edits
    ///
    /// Returns false when there is nothing to retry.
    pub fn retry(&self, member_id: MemberId) -> bool {
        if !self.shared.can_edit() {
            return false;
        }
        let mut state = self.shared.lock();
        if state.closed || !state.overlay.is_dirty(&member_id) {
            return false;
        }
        self.shared.schedule_save(&mut state, member_id);
        true
    }

    /// Drop a member's unsaved edits and cancel its pending save
    pub fn discard(&self, member_id: MemberId) -> Option<PendingEdit> {
        if !self.shared.can_edit() {
            return None;
        }
        let mut state = self.shared.lock();
        if state.closed {
            return None;
        }
        state.scheduler.cancel(&member_id);
        let discarded = state.overlay.discard(&member_id);
        if discarded.is_some() {
            info!("Discarded unsaved edits for {}", member_id);
        }
        discarded
    }

    pub fn status(&self, member_id: &MemberId) -> Option<SaveStatus> {
        self.shared.lock().status.get(member_id)
    }

    pub fn pending(&self, member_id: &MemberId) -> Option<PendingEdit> {
        self.shared.lock().overlay.get(member_id).copied()
    }

    pub fn effective(&self, member_id: &MemberId) -> EffectiveRatings {
        self.shared.lock().effective(member_id)
    }

    /// Effective composite of one member (undefined unless both ratings are)
    pub fn composite(&self, member_id: &MemberId) -> Option<f64> {
        let effective = self.effective(member_id);
        resolve_composite(self.shared.policy.as_ref(), effective.skill, effective.physical)
    }

    /// Merged view of one member
    pub fn view(&self, member_id: &MemberId) -> Option<MemberView> {
        let state = self.shared.lock();
        let index = *state.roster_index.get(member_id)?;
        Some(state.view(index, self.shared.policy.as_ref()))
    }

    /// Merged views of every member in roster order
    pub fn all_views(&self) -> Vec<MemberView> {
        let state = self.shared.lock();
        (0..state.roster.len())
            .map(|index| state.view(index, self.shared.policy.as_ref()))
            .collect()
    }

    /// Filtered and ordered merged view
    pub fn views(&self, filter: &ViewFilter, sort: SortKey) -> Vec<MemberView> {
        pipeline::filter_and_sort(self.all_views(), filter, sort)
    }

    /// Toggle a member's selection; returns whether it is now selected
    ///
    /// Ids not on the roster are never selected.
    pub fn toggle_selection(&self, member_id: MemberId) -> bool {
        if !self.shared.can_edit() {
            return false;
        }
        let (selected, count) = {
            let mut state = self.shared.lock();
            if !state.on_roster(&member_id) {
                debug!("Selection of {} ignored: not on the roster", member_id);
                return false;
            }
            let selected = state.selection.toggle(member_id);
            (selected, state.selection.len())
        };
        self.shared.events.emit_lossy(EditorEvent::SelectionChanged { selected: count });
        selected
    }

    /// Select exactly the given (visible) members, skipping ids not on the roster
    pub fn select_all<I>(&self, visible: I)
    where
        I: IntoIterator<Item = MemberId>,
    {
        if !self.shared.can_edit() {
            return;
        }
        let count = {
            let mut state = self.shared.lock();
            let on_roster: Vec<MemberId> =
                visible.into_iter().filter(|id| state.on_roster(id)).collect();
            state.selection.select_all(on_roster);
            state.selection.len()
        };
        self.shared.events.emit_lossy(EditorEvent::SelectionChanged { selected: count });
    }

    /// Select every member passing `filter`
    pub fn select_visible(&self, filter: &ViewFilter) -> usize {
        let visible: Vec<MemberId> = self
            .views(filter, SortKey::default())
            .into_iter()
            .map(|v| v.member_id)
            .collect();
        self.select_all(visible);
        self.selected().len()
    }

    pub fn clear_selection(&self) {
        if !self.shared.can_edit() {
            return;
        }
        self.shared.lock().selection.clear();
        self.shared.events.emit_lossy(EditorEvent::SelectionChanged { selected: 0 });
    }

    pub fn is_selected(&self, member_id: &MemberId) -> bool {
        self.shared.lock().selection.contains(member_id)
    }

    /// Selected members in roster order (ids not on the roster last)
    pub fn selected(&self) -> Vec<MemberId> {
        let state = self.shared.lock();
        let mut ids: Vec<MemberId> = state.selection.iter().copied().collect();
        ids.sort_by_key(|id| (state.roster_index.get(id).copied().unwrap_or(usize::MAX), *id));
        ids
    }

    /// Rating change history of a member, newest first
    pub async fn history(&self, member_id: MemberId) -> Result<Vec<AuditEntry>> {
        let mut entries = self.shared.ports.audit.history(member_id).await?;
        entries.sort_by(|a, b| b.changed_at.cmp(&a.changed_at));
        Ok(entries)
    }

    pub fn summary(&self) -> EditorSummary {
        let state = self.shared.lock();
        let rated = state
            .roster
            .iter()
            .filter(|m| state.effective(&m.id).complete().is_some())
            .count();
        let missing_rating = state
            .roster
            .iter()
            .filter(|m| state.canonical.get(&m.id).and_then(|c| c.skill_rating).is_none())
            .count();
        EditorSummary {
            members: state.roster.len(),
            rated,
            missing_rating,
            unsaved: state.overlay.len(),
            selected: state.selection.len(),
            bulk_running: state.bulk_running,
        }
    }

    pub fn timer_counts(&self) -> TimerCounts {
        let state = self.shared.lock();
        TimerCounts {
            debounce: state.scheduler.len(),
            expiry: state.status.live_timers(),
        }
    }

    pub fn can_edit(&self) -> bool {
        self.shared.can_edit()
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.shared.settings
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Tear down the session
    ///
    /// Cancels every debounce and status-expiry timer. Persistence calls already
    /// in flight complete, but their results no longer arm anything.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        let debounce = state.scheduler.cancel_all();
        let expiry = state.status.cancel_all();
        info!(
            "Rating editor shut down ({} debounce, {} expiry timers canceled)",
            debounce, expiry
        );
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}
