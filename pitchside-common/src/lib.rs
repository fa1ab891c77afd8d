//! # Pitchside Common Library
//!
//! Shared code for the Pitchside league services including:
//! - Roster/rating domain identifiers and enums
//! - Editor event types and the EventBus
//! - Configuration loading (TOML bootstrap + built-in defaults)
//! - SSE helpers
//! - Utility functions

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;
pub mod types;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use types::{MemberId, RatingField, SaveStatus};
