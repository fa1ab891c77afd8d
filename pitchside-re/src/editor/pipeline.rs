//! Sort/filter pipeline over the merged (canonical + overlay) view
//!
//! Ordering is fully deterministic: every sort key falls back to the member's
//! index in the unsorted roster, so sorting unchanged data twice yields the
//! same order.

use chrono::{DateTime, Utc};
use pitchside_common::{MemberId, SaveStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Merged per-member read model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberView {
    pub member_id: MemberId,
    /// Position in the unsorted roster (tie-break for every sort)
    pub roster_index: usize,
    pub name: String,
    pub nickname: Option<String>,
    /// Normalized position code (GK, DEF, MID, FWD or the raw value uppercased)
    pub position: String,
    pub monthly_payer: bool,
    /// Effective ratings (overlay ?? canonical)
    pub skill: Option<u8>,
    pub physical: Option<u8>,
    pub composite: Option<f64>,
    /// Canonical ratings as last fetched
    pub canonical_skill: Option<u8>,
    pub canonical_physical: Option<u8>,
    pub canonical_composite: Option<f64>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub last_updated_by_name: Option<String>,
    /// Member has unsaved (pending) edits
    pub dirty: bool,
    pub status: Option<SaveStatus>,
    pub selected: bool,
}

/// Position filter choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionFilter {
    #[default]
    Any,
    Gk,
    Def,
    Mid,
    Fwd,
}

impl PositionFilter {
    /// Normalized position code this filter matches (`None` for Any)
    pub fn code(&self) -> Option<&'static str> {
        match self {
            PositionFilter::Any => None,
            PositionFilter::Gk => Some("GK"),
            PositionFilter::Def => Some("DEF"),
            PositionFilter::Mid => Some("MID"),
            PositionFilter::Fwd => Some("FWD"),
        }
    }
}

impl FromStr for PositionFilter {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ANY" => Ok(PositionFilter::Any),
            "GK" => Ok(PositionFilter::Gk),
            "DEF" => Ok(PositionFilter::Def),
            "MID" => Ok(PositionFilter::Mid),
            "FWD" => Ok(PositionFilter::Fwd),
            other => Err(crate::Error::Validation(format!("Unknown position filter: {}", other))),
        }
    }
}

/// Sort keys; numeric keys sort descending, text keys ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Composite,
    Skill,
    Physical,
    LastUpdated,
    /// Case-insensitive: names are lowercased before the lexicographic compare
    Name,
    /// Normalized position code (GK, DEF, MID, FWD), ascending
    Position,
}

impl FromStr for SortKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "composite" => Ok(SortKey::Composite),
            "skill" => Ok(SortKey::Skill),
            "physical" => Ok(SortKey::Physical),
            "lastUpdated" | "last_updated" => Ok(SortKey::LastUpdated),
            "name" => Ok(SortKey::Name),
            "position" => Ok(SortKey::Position),
            other => Err(crate::Error::Validation(format!("Unknown sort key: {}", other))),
        }
    }
}

/// Filters applied before sorting; all predicates are AND-ed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewFilter {
    /// Case-insensitive substring of name or nickname
    pub query: String,
    pub position: PositionFilter,
    pub monthly_payers_only: bool,
    /// Only members whose canonical skill rating is missing
    pub missing_rating_only: bool,
}

/// Map free-text roster positions to codes by prefix
///
/// "gol…" → GK, "zag…" → DEF, "mei…" → MID, "ata…" → FWD; anything else is
/// returned uppercased verbatim.
pub fn normalize_position(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if lower.starts_with("gol") {
        "GK".to_string()
    } else if lower.starts_with("zag") {
        "DEF".to_string()
    } else if lower.starts_with("mei") {
        "MID".to_string()
    } else if lower.starts_with("ata") {
        "FWD".to_string()
    } else {
        trimmed.to_uppercase()
    }
}

/// Whether a view passes every filter predicate
pub fn matches(view: &MemberView, filter: &ViewFilter) -> bool {
    let query = filter.query.trim().to_lowercase();
    if !query.is_empty() {
        let in_name = view.name.to_lowercase().contains(&query);
        let in_nickname = view
            .nickname
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&query));
        if !in_name && !in_nickname {
            return false;
        }
    }

    if let Some(code) = filter.position.code() {
        if view.position != code {
            return false;
        }
    }

    if filter.monthly_payers_only && !view.monthly_payer {
        return false;
    }

    if filter.missing_rating_only && view.canonical_skill.is_some() {
        return false;
    }

    true
}

/// Descending with `None` below every real value
fn desc<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &MemberView, b: &MemberView, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::Composite => desc(a.composite, b.composite),
        SortKey::Skill => desc(a.skill, b.skill),
        SortKey::Physical => desc(a.physical, b.physical),
        SortKey::LastUpdated => desc(a.last_updated_at, b.last_updated_at),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Position => a.position.cmp(&b.position),
    };
    primary.then(a.roster_index.cmp(&b.roster_index))
}

/// Sort in place by `key`, ties broken by roster index
pub fn sort_views(views: &mut [MemberView], key: SortKey) {
    views.sort_by(|a, b| compare(a, b, key));
}

/// Filter then sort
pub fn filter_and_sort(views: Vec<MemberView>, filter: &ViewFilter, key: SortKey) -> Vec<MemberView> {
    let mut visible: Vec<MemberView> = views.into_iter().filter(|v| matches(v, filter)).collect();
    sort_views(&mut visible, key);
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn view(index: usize, name: &str, skill: Option<u8>, physical: Option<u8>) -> MemberView {
        let composite = match (skill, physical) {
            (Some(s), Some(p)) => Some((f64::from(s) + f64::from(p)) / 2.0),
            _ => None,
        };
        MemberView {
            member_id: Uuid::new_v4(),
            roster_index: index,
            name: name.to_string(),
            nickname: None,
            position: "MID".to_string(),
            monthly_payer: false,
            skill,
            physical,
            composite,
            canonical_skill: skill,
            canonical_physical: physical,
            canonical_composite: composite,
            last_updated_at: None,
            last_updated_by_name: None,
            dirty: false,
            status: None,
            selected: false,
        }
    }

    fn names(views: &[MemberView]) -> Vec<&str> {
        views.iter().map(|v| v.name.as_str()).collect()
    }

    #[test]
    fn test_normalize_position_prefixes() {
        assert_eq!(normalize_position("Goleiro"), "GK");
        assert_eq!(normalize_position("zagueiro central"), "DEF");
        assert_eq!(normalize_position("Meia-atacante"), "MID");
        assert_eq!(normalize_position("ATACANTE"), "FWD");
        assert_eq!(normalize_position("lateral"), "LATERAL");
        assert_eq!(normalize_position("gk"), "GK");
        assert_eq!(normalize_position(""), "");
    }

    #[test]
    fn test_composite_desc_with_missing_last() {
        let mut views = vec![
            view(0, "low", Some(1), Some(1)),
            view(1, "none", Some(5), None),
            view(2, "high", Some(5), Some(5)),
        ];
        sort_views(&mut views, SortKey::Composite);
        assert_eq!(names(&views), vec!["high", "low", "none"]);
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let mut views = vec![
            view(0, "first", Some(3), Some(3)),
            view(1, "top", Some(5), Some(5)),
            view(2, "second", Some(4), Some(2)),
        ];
        sort_views(&mut views, SortKey::Composite);
        assert_eq!(names(&views), vec!["top", "first", "second"]);

        // Re-sorting is reproducible
        let again = views.clone();
        sort_views(&mut views, SortKey::Composite);
        assert_eq!(views, again);
    }

    #[test]
    fn test_ties_use_original_index_not_current_order() {
        let mut views = vec![
            view(2, "c", Some(3), Some(3)),
            view(0, "a", Some(3), Some(3)),
            view(1, "b", Some(3), Some(3)),
        ];
        sort_views(&mut views, SortKey::Skill);
        assert_eq!(names(&views), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_name_sort_ascending_case_insensitive() {
        let mut views = vec![
            view(0, "bruno", None, None),
            view(1, "Ana", None, None),
            view(2, "Caio", None, None),
        ];
        sort_views(&mut views, SortKey::Name);
        assert_eq!(names(&views), vec!["Ana", "bruno", "Caio"]);
    }

    #[test]
    fn test_position_sort_ascending() {
        let mut gk = view(0, "gk", None, None);
        gk.position = "GK".to_string();
        let mut def = view(1, "def", None, None);
        def.position = "DEF".to_string();
        let mut views = vec![gk, def];
        sort_views(&mut views, SortKey::Position);
        assert_eq!(names(&views), vec!["def", "gk"]);
    }

    #[test]
    fn test_last_updated_desc() {
        let mut old = view(0, "old", None, None);
        old.last_updated_at = Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let mut recent = view(1, "recent", None, None);
        recent.last_updated_at = Some(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap());
        let never = view(2, "never", None, None);

        let mut views = vec![never, old, recent];
        sort_views(&mut views, SortKey::LastUpdated);
        assert_eq!(names(&views), vec!["recent", "old", "never"]);
    }

    #[test]
    fn test_query_matches_name_or_nickname() {
        let mut nick = view(0, "Carlos Souza", None, None);
        nick.nickname = Some("Carlinhos".to_string());
        let other = view(1, "Pedro", None, None);

        let filter = ViewFilter {
            query: "LINHOS".to_string(),
            ..Default::default()
        };
        let visible = filter_and_sort(vec![nick, other], &filter, SortKey::Name);
        assert_eq!(names(&visible), vec!["Carlos Souza"]);
    }

    #[test]
    fn test_filters_are_anded() {
        let mut payer_gk = view(0, "payer gk", None, None);
        payer_gk.position = "GK".to_string();
        payer_gk.monthly_payer = true;
        let mut payer_mid = view(1, "payer mid", None, None);
        payer_mid.monthly_payer = true;
        let mut rated_gk = view(2, "rated gk", Some(3), Some(3));
        rated_gk.position = "GK".to_string();
        rated_gk.monthly_payer = true;

        let filter = ViewFilter {
            position: PositionFilter::Gk,
            monthly_payers_only: true,
            missing_rating_only: true,
            ..Default::default()
        };
        let visible = filter_and_sort(vec![payer_gk, payer_mid, rated_gk], &filter, SortKey::Name);
        assert_eq!(names(&visible), vec!["payer gk"]);
    }

    #[test]
    fn test_missing_rating_uses_canonical_skill() {
        let mut edited = view(0, "edited", None, None);
        edited.skill = Some(4); // overlay only
        let filter = ViewFilter {
            missing_rating_only: true,
            ..Default::default()
        };
        assert!(matches(&edited, &filter));
    }

    #[test]
    fn test_parse_wire_values() {
        assert_eq!("gk".parse::<PositionFilter>().unwrap(), PositionFilter::Gk);
        assert_eq!("ANY".parse::<PositionFilter>().unwrap(), PositionFilter::Any);
        assert!("LB".parse::<PositionFilter>().is_err());
        assert_eq!("lastUpdated".parse::<SortKey>().unwrap(), SortKey::LastUpdated);
        assert_eq!("".parse::<SortKey>().unwrap(), SortKey::Composite);
        assert!("age".parse::<SortKey>().is_err());
    }
}
