//! In-process backend
//!
//! Holds roster, ratings and history in memory. Every submit is recorded, which
//! makes it the backend of choice for tests and local demos; individual members
//! (or every member) can be made to fail on demand.

use super::{AuditHistory, PersistenceError, RatingSource, RatingSubmitter, RosterSource};
use crate::editor::composite::{CompositePolicy, WeightedMean};
use crate::error::{Error, Result};
use crate::model::{AuditEntry, RatingRecord, RosterMember};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pitchside_common::{time, MemberId};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// One recorded submit call
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub member_id: MemberId,
    pub skill_rating: u8,
    pub physical_rating: u8,
    pub succeeded: bool,
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
    roster: Vec<RosterMember>,
    ratings: HashMap<MemberId, RatingRecord>,
    history: HashMap<MemberId, Vec<AuditEntry>>,
    submissions: Vec<Submission>,
    failing: HashSet<MemberId>,
    fail_all: bool,
    fail_reads: bool,
}

/// In-memory implementation of every backend port
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
    latency: Option<Duration>,
    actor_name: String,
}

impl InMemoryBackend {
    pub fn new(roster: Vec<RosterMember>, ratings: Vec<RatingRecord>) -> Self {
        let ratings = ratings.into_iter().map(|r| (r.member_id, r)).collect();
        Self {
            state: Mutex::new(MemoryState {
                roster,
                ratings,
                ..Default::default()
            }),
            latency: None,
            actor_name: "pitchside".to_string(),
        }
    }

    /// Delay every submit by `latency` (observable on a paused test clock)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Name recorded as `lastUpdatedByName` on successful submits
    pub fn with_actor_name(mut self, name: impl Into<String>) -> Self {
        self.actor_name = name.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the roster served by subsequent reads
    pub fn set_roster(&self, roster: Vec<RosterMember>) {
        self.lock().roster = roster;
    }

    /// Make submits for `member_id` fail until [`recover_member`](Self::recover_member)
    pub fn fail_member(&self, member_id: MemberId) {
        self.lock().failing.insert(member_id);
    }

    pub fn recover_member(&self, member_id: MemberId) {
        self.lock().failing.remove(&member_id);
    }

    /// Make every submit fail (or succeed again)
    pub fn set_fail_all(&self, fail: bool) {
        self.lock().fail_all = fail;
    }

    /// Make roster/rating/history reads fail (or succeed again)
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Every submit call received so far, in arrival order
    pub fn submissions(&self) -> Vec<Submission> {
        self.lock().submissions.clone()
    }

    /// Submit calls received for one member
    pub fn submissions_for(&self, member_id: MemberId) -> Vec<Submission> {
        self.lock()
            .submissions
            .iter()
            .filter(|s| s.member_id == member_id)
            .cloned()
            .collect()
    }

    /// Current stored record of a member
    pub fn record(&self, member_id: MemberId) -> Option<RatingRecord> {
        self.lock().ratings.get(&member_id).cloned()
    }

    fn check_reads(&self) -> Result<()> {
        if self.lock().fail_reads {
            return Err(Error::Backend("in-memory backend unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RosterSource for InMemoryBackend {
    async fn roster(&self) -> Result<Vec<RosterMember>> {
        self.check_reads()?;
        Ok(self.lock().roster.clone())
    }
}

#[async_trait]
impl RatingSource for InMemoryBackend {
    async fn ratings(&self) -> Result<Vec<RatingRecord>> {
        self.check_reads()?;
        let state = self.lock();
        // Roster order keeps snapshots reproducible
        let mut records: Vec<RatingRecord> = state
            .roster
            .iter()
            .filter_map(|m| state.ratings.get(&m.id).cloned())
            .collect();
        let on_roster: HashSet<MemberId> = state.roster.iter().map(|m| m.id).collect();
        records.extend(
            state
                .ratings
                .values()
                .filter(|r| !on_roster.contains(&r.member_id))
                .cloned(),
        );
        Ok(records)
    }
}

#[async_trait]
impl RatingSubmitter for InMemoryBackend {
    async fn submit(
        &self,
        member_id: MemberId,
        skill_rating: u8,
        physical_rating: u8,
    ) -> std::result::Result<(), PersistenceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.lock();
        let now = time::now();
        let fails = state.fail_all || state.failing.contains(&member_id);
        state.submissions.push(Submission {
            member_id,
            skill_rating,
            physical_rating,
            succeeded: !fails,
            at: now,
        });

        if fails {
            debug!("In-memory submit for {} rejected", member_id);
            return Err(PersistenceError::Rejected {
                status: 503,
                message: "submit rejected".to_string(),
            });
        }

        let composite = WeightedMean::default().composite(skill_rating, physical_rating);
        let record = state
            .ratings
            .entry(member_id)
            .or_insert_with(|| RatingRecord::unrated(member_id));
        record.skill_rating = Some(skill_rating);
        record.physical_rating = Some(physical_rating);
        record.composite_rating = Some(composite);
        record.last_updated_at = Some(now);
        record.last_updated_by_name = Some(self.actor_name.clone());

        let entry = AuditEntry {
            skill_rating: Some(skill_rating),
            physical_rating: Some(physical_rating),
            composite_rating: Some(composite),
            changed_at: now,
            changed_by_name: Some(self.actor_name.clone()),
        };
        state.history.entry(member_id).or_default().push(entry);
        Ok(())
    }
}

#[async_trait]
impl AuditHistory for InMemoryBackend {
    async fn history(&self, member_id: MemberId) -> Result<Vec<AuditEntry>> {
        self.check_reads()?;
        Ok(self
            .lock()
            .history
            .get(&member_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn member(name: &str) -> RosterMember {
        RosterMember {
            id: Uuid::new_v4(),
            name: name.to_string(),
            nickname: None,
            position: "Meia".to_string(),
            monthly_payer: false,
        }
    }

    #[tokio::test]
    async fn test_submit_updates_record_and_history() {
        let m = member("Ana");
        let backend = InMemoryBackend::new(vec![m.clone()], vec![]);

        backend.submit(m.id, 4, 2).await.unwrap();

        let record = backend.record(m.id).unwrap();
        assert_eq!(record.skill_rating, Some(4));
        assert_eq!(record.physical_rating, Some(2));
        assert_eq!(record.composite_rating, Some(3.0));
        assert_eq!(backend.history(m.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failing_member_is_recorded_but_not_stored() {
        let m = member("Bia");
        let backend = InMemoryBackend::new(vec![m.clone()], vec![]);
        backend.fail_member(m.id);

        let err = backend.submit(m.id, 4, 2).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Rejected { .. }));
        assert!(backend.record(m.id).is_none());

        let calls = backend.submissions();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].succeeded);
    }

    #[tokio::test]
    async fn test_ratings_follow_roster_order() {
        let a = member("A");
        let b = member("B");
        let backend = InMemoryBackend::new(
            vec![a.clone(), b.clone()],
            vec![RatingRecord::unrated(b.id), RatingRecord::unrated(a.id)],
        );
        let ids: Vec<_> = backend.ratings().await.unwrap().iter().map(|r| r.member_id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let backend = InMemoryBackend::new(vec![], vec![]);
        backend.set_fail_reads(true);
        assert!(backend.roster().await.is_err());
        backend.set_fail_reads(false);
        assert!(backend.roster().await.unwrap().is_empty());
    }
}
