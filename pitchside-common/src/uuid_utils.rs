//! UUID utilities

use crate::types::MemberId;
use uuid::Uuid;

/// Parse a member id from a path segment or form value
///
/// Surrounding whitespace is tolerated; anything else must be a valid UUID.
pub fn parse_member_id(s: &str) -> crate::Result<MemberId> {
    Uuid::parse_str(s.trim())
        .map_err(|e| crate::Error::InvalidInput(format!("Invalid member id '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_member_id_trims() {
        let id = Uuid::new_v4();
        let parsed = parse_member_id(&format!("  {}\n", id)).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_member_id_rejects_garbage() {
        let err = parse_member_id("athlete-7").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }
}
