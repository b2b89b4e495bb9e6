//! Core types for Comanda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod activity;
pub mod code;
pub mod email;
pub mod id;
pub mod role;
pub mod segment;
pub mod slug;

pub use activity::{Frequency, Recency};
pub use code::{InstitutionCodeError, MAX_CODE_LENGTH, normalize_code};
pub use email::{Email, EmailError};
pub use id::*;
pub use role::{StaffRole, StaffRoleError};
pub use segment::CustomerSegment;
pub use slug::{base_slug, institution_slug};
