//! External collaborators of the rating editor
//!
//! The editor owns no persistence of its own. Roster, rating snapshot, audit
//! history and the submit operation are reached through these ports; the
//! capability gate decides whether the current actor may mutate anything.

pub mod gate;
pub mod http;
pub mod memory;

pub use gate::{ActorRole, CapabilityGate, StaticGate};
pub use http::HttpBackend;
pub use memory::{InMemoryBackend, Submission};

use crate::error::Result;
use crate::model::{AuditEntry, RatingRecord, RosterMember};
use async_trait::async_trait;
use pitchside_common::MemberId;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single submit call
///
/// Never propagated out of the editor; converted into a Failed save status.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// Backend answered but refused the update
    #[error("rejected by backend ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Request never produced a usable answer
    #[error("transport failure: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,
}

/// Read-only roster of the active scope
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn roster(&self) -> Result<Vec<RosterMember>>;
}

/// Canonical rating snapshot of the active scope
#[async_trait]
pub trait RatingSource: Send + Sync {
    async fn ratings(&self) -> Result<Vec<RatingRecord>>;
}

/// Persistence operation for one member's ratings
///
/// Success implies the backend recomputed and stored composite and timestamps.
#[async_trait]
pub trait RatingSubmitter: Send + Sync {
    async fn submit(
        &self,
        member_id: MemberId,
        skill_rating: u8,
        physical_rating: u8,
    ) -> std::result::Result<(), PersistenceError>;
}

/// Read-only rating change history
#[async_trait]
pub trait AuditHistory: Send + Sync {
    async fn history(&self, member_id: MemberId) -> Result<Vec<AuditEntry>>;
}

/// Bundle of the ports an editing session talks to
#[derive(Clone)]
pub struct EditorPorts {
    pub roster: Arc<dyn RosterSource>,
    pub ratings: Arc<dyn RatingSource>,
    pub submitter: Arc<dyn RatingSubmitter>,
    pub audit: Arc<dyn AuditHistory>,
}

impl EditorPorts {
    /// Use one backend object for every port
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: RosterSource + RatingSource + RatingSubmitter + AuditHistory + 'static,
    {
        Self {
            roster: backend.clone(),
            ratings: backend.clone(),
            submitter: backend.clone(),
            audit: backend,
        }
    }
}
