//! Multi-selection of bulk targets

use pitchside_common::MemberId;
use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    ids: HashSet<MemberId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `member_id`; returns whether it is now selected
    pub fn toggle(&mut self, member_id: MemberId) -> bool {
        if self.ids.remove(&member_id) {
            false
        } else {
            self.ids.insert(member_id);
            true
        }
    }

    /// Replace the selection with exactly the given (visible) ids
    pub fn select_all<I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = MemberId>,
    {
        self.ids = visible.into_iter().collect();
    }

    /// Keep only ids passing `keep`; returns how many were dropped
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&MemberId) -> bool,
    {
        let before = self.ids.len();
        self.ids.retain(|id| keep(id));
        before - self.ids.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, member_id: &MemberId) -> bool {
        self.ids.contains(member_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberId> {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_toggle_twice_deselects() {
        let id = Uuid::new_v4();
        let mut selection = SelectionSet::new();
        assert!(selection.toggle(id));
        assert!(selection.contains(&id));
        assert!(!selection.toggle(id));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_select_all_replaces() {
        let stale = Uuid::new_v4();
        let visible = [Uuid::new_v4(), Uuid::new_v4()];
        let mut selection = SelectionSet::new();
        selection.toggle(stale);

        selection.select_all(visible);
        assert_eq!(selection.len(), 2);
        assert!(!selection.contains(&stale));

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_reports_dropped() {
        let (kept, gone) = (Uuid::new_v4(), Uuid::new_v4());
        let mut selection = SelectionSet::new();
        selection.select_all([kept, gone]);

        assert_eq!(selection.retain(|id| *id == kept), 1);
        assert!(selection.contains(&kept));
        assert!(!selection.contains(&gone));
    }
}
