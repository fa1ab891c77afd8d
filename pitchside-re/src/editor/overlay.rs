//! Edit overlay
//!
//! Pending, unconfirmed local edits layered over the last known canonical
//! snapshot. Each pending edit carries a revision stamp so that a persistence
//! result can tell whether the edit it carried is still the latest one.

use crate::model::RatingRecord;
use pitchside_common::{MemberId, RatingField};
use serde::Serialize;
use std::collections::HashMap;

/// Unconfirmed overrides for one member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PendingEdit {
    pub skill: Option<u8>,
    pub physical: Option<u8>,
    #[serde(skip)]
    revision: u64,
}

impl PendingEdit {
    pub fn get(&self, field: RatingField) -> Option<u8> {
        match field {
            RatingField::Skill => self.skill,
            RatingField::Physical => self.physical,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Skill and physical ratings after applying the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectiveRatings {
    pub skill: Option<u8>,
    pub physical: Option<u8>,
}

impl EffectiveRatings {
    /// Both ratings, if both are defined
    pub fn complete(&self) -> Option<(u8, u8)> {
        Some((self.skill?, self.physical?))
    }
}

/// `overlay(field) ?? canonical(field)`
pub fn effective(overlay: Option<u8>, canonical: Option<u8>) -> Option<u8> {
    overlay.or(canonical)
}

/// Merge a member's pending edit (if any) over its canonical record (if any)
pub fn effective_ratings(
    pending: Option<&PendingEdit>,
    canonical: Option<&RatingRecord>,
) -> EffectiveRatings {
    EffectiveRatings {
        skill: effective(
            pending.and_then(|p| p.skill),
            canonical.and_then(|c| c.skill_rating),
        ),
        physical: effective(
            pending.and_then(|p| p.physical),
            canonical.and_then(|c| c.physical_rating),
        ),
    }
}

/// Pending edits of every member
#[derive(Debug, Default)]
pub struct EditOverlay {
    edits: HashMap<MemberId, PendingEdit>,
    next_revision: u64,
}

impl EditOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one field into the member's pending edit, leaving the other field untouched
    ///
    /// Returns the new revision of the pending edit.
    pub fn set(&mut self, member_id: MemberId, field: RatingField, value: u8) -> u64 {
        self.next_revision += 1;
        let revision = self.next_revision;
        let edit = self.edits.entry(member_id).or_insert(PendingEdit {
            skill: None,
            physical: None,
            revision,
        });
        match field {
            RatingField::Skill => edit.skill = Some(value),
            RatingField::Physical => edit.physical = Some(value),
        }
        edit.revision = revision;
        revision
    }

    pub fn get(&self, member_id: &MemberId) -> Option<&PendingEdit> {
        self.edits.get(member_id)
    }

    pub fn revision(&self, member_id: &MemberId) -> Option<u64> {
        self.edits.get(member_id).map(|e| e.revision)
    }

    pub fn is_dirty(&self, member_id: &MemberId) -> bool {
        self.edits.contains_key(member_id)
    }

    /// Remove the member's pending edit if it still has `revision`
    ///
    /// An edit that changed after `revision` was captured is kept. Returns true
    /// when an edit was removed.
    pub fn clear_if_revision(&mut self, member_id: &MemberId, revision: Option<u64>) -> bool {
        match (self.revision(member_id), revision) {
            (Some(current), Some(expected)) if current == expected => {
                self.edits.remove(member_id);
                true
            }
            _ => false,
        }
    }

    /// Unconditionally drop the member's pending edit
    pub fn discard(&mut self, member_id: &MemberId) -> Option<PendingEdit> {
        self.edits.remove(member_id)
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn canonical(member_id: MemberId, skill: Option<u8>, physical: Option<u8>) -> RatingRecord {
        RatingRecord {
            skill_rating: skill,
            physical_rating: physical,
            ..RatingRecord::unrated(member_id)
        }
    }

    #[test]
    fn test_effective_prefers_overlay() {
        assert_eq!(effective(Some(2), Some(5)), Some(2));
        assert_eq!(effective(None, Some(5)), Some(5));
        assert_eq!(effective(Some(2), None), Some(2));
        assert_eq!(effective(None, None), None);
    }

    #[test]
    fn test_set_merges_fields() {
        let id = Uuid::new_v4();
        let mut overlay = EditOverlay::new();
        overlay.set(id, RatingField::Skill, 4);
        overlay.set(id, RatingField::Physical, 2);
        overlay.set(id, RatingField::Skill, 5);

        let edit = overlay.get(&id).unwrap();
        assert_eq!(edit.skill, Some(5));
        assert_eq!(edit.physical, Some(2));
    }

    #[test]
    fn test_effective_ratings_mix_overlay_and_canonical() {
        let id = Uuid::new_v4();
        let mut overlay = EditOverlay::new();
        overlay.set(id, RatingField::Skill, 5);
        let record = canonical(id, Some(1), Some(3));

        let ratings = effective_ratings(overlay.get(&id), Some(&record));
        assert_eq!(ratings.complete(), Some((5, 3)));
    }

    #[test]
    fn test_partial_ratings_not_complete() {
        let id = Uuid::new_v4();
        let mut overlay = EditOverlay::new();
        overlay.set(id, RatingField::Skill, 4);

        let ratings = effective_ratings(overlay.get(&id), None);
        assert_eq!(ratings.skill, Some(4));
        assert_eq!(ratings.complete(), None);
    }

    #[test]
    fn test_clear_requires_matching_revision() {
        let id = Uuid::new_v4();
        let mut overlay = EditOverlay::new();
        let first = overlay.set(id, RatingField::Skill, 4);
        let second = overlay.set(id, RatingField::Skill, 3);
        assert_ne!(first, second);

        assert!(!overlay.clear_if_revision(&id, Some(first)));
        assert!(overlay.is_dirty(&id));
        assert!(overlay.clear_if_revision(&id, Some(second)));
        assert!(!overlay.is_dirty(&id));
    }

    #[test]
    fn test_clear_without_revision_is_noop() {
        let id = Uuid::new_v4();
        let mut overlay = EditOverlay::new();
        overlay.set(id, RatingField::Physical, 2);
        assert!(!overlay.clear_if_revision(&id, None));
        assert_eq!(overlay.len(), 1);
    }
}
