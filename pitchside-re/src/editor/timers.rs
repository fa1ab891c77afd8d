//! Keyed registry of cancelable timers
//!
//! At most one live timer per key. Arming a key cancels and replaces whatever
//! was armed before. Every timer carries a token; its callback must call
//! [`TimerRegistry::release`] with that token before acting, which fails if the
//! timer was replaced or canceled in the meantime (abort cannot interrupt a
//! callback that already woke up and is waiting for the state lock).
//!
//! Dropping the registry cancels everything still armed.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::debug;

/// Identity of one arming of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

pub struct TimerRegistry<K> {
    label: &'static str,
    runtime: Handle,
    next_token: u64,
    armed: HashMap<K, (TimerToken, AbortHandle)>,
}

impl<K> TimerRegistry<K>
where
    K: Eq + Hash + Copy + Debug,
{
    pub fn new(label: &'static str, runtime: Handle) -> Self {
        Self {
            label,
            runtime,
            next_token: 0,
            armed: HashMap::new(),
        }
    }

    /// Arm (or re-arm) the timer for `key`
    ///
    /// After `delay`, `on_fire(token)` is awaited on the runtime.
    pub fn arm<F, Fut>(&mut self, key: K, delay: Duration, on_fire: F) -> TimerToken
    where
        F: FnOnce(TimerToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel(&key);

        self.next_token += 1;
        let token = TimerToken(self.next_token);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            on_fire(token).await;
        });
        self.armed.insert(key, (token, task.abort_handle()));

        debug!("{} timer armed for {:?} ({:?})", self.label, key, delay);
        token
    }

    /// Cancel the timer for `key`; returns true if one was armed
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.armed.remove(key) {
            Some((_, handle)) => {
                handle.abort();
                debug!("{} timer canceled for {:?}", self.label, key);
                true
            }
            None => false,
        }
    }

    /// Claim a fired timer
    ///
    /// Returns true (and forgets the entry) only if `token` is still the live
    /// timer for `key`. Called from inside the timer's own callback.
    pub fn release(&mut self, key: &K, token: TimerToken) -> bool {
        match self.armed.get(key) {
            Some((current, _)) if *current == token => {
                self.armed.remove(key);
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self, key: &K) -> bool {
        self.armed.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Cancel every armed timer; returns how many were canceled
    pub fn cancel_all(&mut self) -> usize {
        let count = self.armed.len();
        for (_, (_, handle)) in self.armed.drain() {
            handle.abort();
        }
        if count > 0 {
            debug!("{} timers canceled: {}", self.label, count);
        }
        count
    }
}

impl<K> Drop for TimerRegistry<K> {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.armed.drain() {
            handle.abort();
        }
    }
}
