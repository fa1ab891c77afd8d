//! Roster and rating records as supplied by the backend
//!
//! All of these are read-only snapshots; the editor never patches them in place.

use chrono::{DateTime, Utc};
use pitchside_common::MemberId;
use serde::{Deserialize, Serialize};

/// Roster member (athlete) of the active scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    pub id: MemberId,
    pub name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    /// Free-text position as entered in the roster (e.g. "Goleiro", "Zagueiro")
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub monthly_payer: bool,
}

/// Last known canonical ratings of one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub member_id: MemberId,
    #[serde(default)]
    pub skill_rating: Option<u8>,
    #[serde(default)]
    pub physical_rating: Option<u8>,
    /// Composite as computed and stored by the backend
    #[serde(default)]
    pub composite_rating: Option<f64>,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated_by_name: Option<String>,
}

impl RatingRecord {
    /// Record with no ratings at all
    pub fn unrated(member_id: MemberId) -> Self {
        Self {
            member_id,
            skill_rating: None,
            physical_rating: None,
            composite_rating: None,
            last_updated_at: None,
            last_updated_by_name: None,
        }
    }
}

/// One entry of a member's rating change history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    #[serde(default)]
    pub skill_rating: Option<u8>,
    #[serde(default)]
    pub physical_rating: Option<u8>,
    #[serde(default)]
    pub composite_rating: Option<f64>,
    pub changed_at: DateTime<Utc>,
    #[serde(default)]
    pub changed_by_name: Option<String>,
}
