//! Session-stored values.

/// Session keys used by the console.
pub mod keys {
    /// Account id ([`comanda_core::SubjectId`]) of the signed-in user.
    pub const SUBJECT: &str = "subject";

    /// Branch the user last selected; survives reloads.
    pub const SELECTED_BRANCH_ID: &str = "selected_branch_id";
}
