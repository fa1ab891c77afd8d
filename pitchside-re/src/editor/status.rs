//! Per-member save status with auto-expiry
//!
//! Single slot per member: setting a status replaces the previous one and
//! restarts (or, for Saving, stops) the member's expiry timer. When the timer
//! fires the entry is removed and the member reverts to neutral.

use super::timers::{TimerRegistry, TimerToken};
use pitchside_common::{MemberId, SaveStatus};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Handle;

pub struct StatusTracker {
    statuses: HashMap<MemberId, SaveStatus>,
    expiry: TimerRegistry<MemberId>,
}

impl StatusTracker {
    pub fn new(runtime: Handle) -> Self {
        Self {
            statuses: HashMap::new(),
            expiry: TimerRegistry::new("status-expiry", runtime),
        }
    }

    /// Replace the member's status
    ///
    /// With a `ttl`, `on_expire(token)` runs after it elapses and must hand the
    /// token back to [`expire`](Self::expire). Without one, any running expiry
    /// timer is canceled and the status stays until replaced.
    pub fn set<F, Fut>(
        &mut self,
        member_id: MemberId,
        status: SaveStatus,
        ttl: Option<Duration>,
        on_expire: F,
    ) where
        F: FnOnce(TimerToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.statuses.insert(member_id, status);
        match ttl {
            Some(ttl) => {
                self.expiry.arm(member_id, ttl, on_expire);
            }
            None => {
                self.expiry.cancel(&member_id);
            }
        }
    }

    /// Remove the member's status if `token` is its live expiry timer
    pub fn expire(&mut self, member_id: &MemberId, token: TimerToken) -> bool {
        if self.expiry.release(member_id, token) {
            self.statuses.remove(member_id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, member_id: &MemberId) -> Option<SaveStatus> {
        self.statuses.get(member_id).copied()
    }

    pub fn live_timers(&self) -> usize {
        self.expiry.len()
    }

    /// Cancel every expiry timer; statuses are left as they are
    pub fn cancel_all(&mut self) -> usize {
        self.expiry.cancel_all()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    fn set_with_expiry(
        tracker: &Arc<Mutex<StatusTracker>>,
        member_id: MemberId,
        status: SaveStatus,
        ttl: Option<Duration>,
    ) {
        let handle = tracker.clone();
        tracker
            .lock()
            .unwrap()
            .set(member_id, status, ttl, move |token| async move {
                handle.lock().unwrap().expire(&member_id, token);
            });
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_expires_after_ttl() {
        let tracker = Arc::new(Mutex::new(StatusTracker::new(Handle::current())));
        let id = Uuid::new_v4();

        set_with_expiry(&tracker, id, SaveStatus::Saved, Some(Duration::from_millis(2000)));
        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(tracker.lock().unwrap().get(&id), Some(SaveStatus::Saved));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(tracker.lock().unwrap().get(&id), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resetting_restarts_expiry() {
        let tracker = Arc::new(Mutex::new(StatusTracker::new(Handle::current())));
        let id = Uuid::new_v4();

        set_with_expiry(&tracker, id, SaveStatus::Saved, Some(Duration::from_millis(2000)));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        set_with_expiry(&tracker, id, SaveStatus::Failed, Some(Duration::from_millis(3200)));
        assert_eq!(tracker.lock().unwrap().live_timers(), 1);

        // The first timer would have fired here
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(tracker.lock().unwrap().get(&id), Some(SaveStatus::Failed));

        tokio::time::sleep(Duration::from_millis(2300)).await;
        assert_eq!(tracker.lock().unwrap().get(&id), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saving_has_no_expiry() {
        let tracker = Arc::new(Mutex::new(StatusTracker::new(Handle::current())));
        let id = Uuid::new_v4();

        set_with_expiry(&tracker, id, SaveStatus::Failed, Some(Duration::from_millis(100)));
        set_with_expiry(&tracker, id, SaveStatus::Saving, None);
        assert_eq!(tracker.lock().unwrap().live_timers(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(tracker.lock().unwrap().get(&id), Some(SaveStatus::Saving));
    }
}
