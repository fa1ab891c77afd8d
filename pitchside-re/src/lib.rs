//! # Pitchside Rating Editor Library (pitchside-re)
//!
//! Per-athlete rating editor with debounced persistence and optimistic
//! reconciliation.
//!
//! **Purpose:** Let an operator edit the skill and physical ratings of many
//! roster members at once. Edits are shown immediately (overlay over the last
//! canonical snapshot), coalesced into one backend call per member, and tracked
//! with a short-lived per-member save status. A bulk apply writes the same values
//! to every selected member, best-effort and one member at a time.
//!
//! **Architecture:** [`editor::RatingEditor`] owns the session state; external
//! collaborators (roster, ratings, submit, audit history, capability gate) are
//! reached through the ports in [`backend`]; [`api`] exposes the session over HTTP.

pub mod api;
pub mod backend;
pub mod editor;
pub mod error;
pub mod model;

pub use editor::RatingEditor;
pub use error::{Error, Result};
