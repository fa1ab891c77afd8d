//! Shared roster/rating identifiers and enums
//!
//! Used by the rating editor, its HTTP surface and the event stream.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Roster member identifier
pub type MemberId = Uuid;

/// One of the two independently editable ratings of a roster member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingField {
    /// Technical skill rating
    Skill,
    /// Physical condition rating
    Physical,
}

impl RatingField {
    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingField::Skill => "skill",
            RatingField::Physical => "physical",
        }
    }
}

impl fmt::Display for RatingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingField {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skill" => Ok(RatingField::Skill),
            "physical" => Ok(RatingField::Physical),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown rating field: {}",
                other
            ))),
        }
    }
}

/// Ephemeral per-member save status
///
/// Absence of a status means the member is neutral (nothing in flight, nothing
/// recently saved or failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    /// Persistence call in flight
    Saving,
    /// Last persistence call succeeded
    Saved,
    /// Last persistence call failed; the edit is still pending
    Failed,
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveStatus::Saving => write!(f, "saving"),
            SaveStatus::Saved => write!(f, "saved"),
            SaveStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_field_parse() {
        assert_eq!("skill".parse::<RatingField>().unwrap(), RatingField::Skill);
        assert_eq!(" Physical ".parse::<RatingField>().unwrap(), RatingField::Physical);
        assert!("speed".parse::<RatingField>().is_err());
    }

    #[test]
    fn test_save_status_serializes_snake_case() {
        let json = serde_json::to_string(&SaveStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }
}
