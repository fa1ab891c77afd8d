//! Capability gate
//!
//! Resolves whether the current actor may edit ratings. Consulted before every
//! mutating call, never cached by the editor.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

/// Edit capability predicate
pub trait CapabilityGate: Send + Sync {
    fn can_edit(&self) -> bool;
}

impl<F> CapabilityGate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn can_edit(&self) -> bool {
        self()
    }
}

/// Actor roles known to the league dashboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Admin,
    Coach,
    Viewer,
}

impl ActorRole {
    pub fn can_edit_ratings(&self) -> bool {
        matches!(self, ActorRole::Admin | ActorRole::Coach)
    }
}

impl FromStr for ActorRole {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(ActorRole::Admin),
            "coach" => Ok(ActorRole::Coach),
            "viewer" => Ok(ActorRole::Viewer),
            other => Err(crate::Error::Config(format!("Unknown actor role: {}", other))),
        }
    }
}

/// Gate with a switchable answer, initialized from a role
pub struct StaticGate {
    allowed: AtomicBool,
}

impl StaticGate {
    pub fn new(allowed: bool) -> Self {
        Self {
            allowed: AtomicBool::new(allowed),
        }
    }

    pub fn for_role(role: ActorRole) -> Self {
        Self::new(role.can_edit_ratings())
    }

    /// Change the answer (e.g. after the actor's role was re-resolved)
    pub fn set_allowed(&self, allowed: bool) {
        self.allowed.store(allowed, Ordering::SeqCst);
    }
}

impl CapabilityGate for StaticGate {
    fn can_edit(&self) -> bool {
        self.allowed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles() {
        assert!("admin".parse::<ActorRole>().unwrap().can_edit_ratings());
        assert!("Coach".parse::<ActorRole>().unwrap().can_edit_ratings());
        assert!(!"viewer".parse::<ActorRole>().unwrap().can_edit_ratings());
        assert!("referee".parse::<ActorRole>().is_err());
    }

    #[test]
    fn test_static_gate_switches() {
        let gate = StaticGate::for_role(ActorRole::Admin);
        assert!(gate.can_edit());
        gate.set_allowed(false);
        assert!(!gate.can_edit());
    }

    #[test]
    fn test_closure_gate() {
        let gate = || false;
        assert!(!CapabilityGate::can_edit(&gate));
    }
}
