//! Domain models for the console.
//!
//! These are validated values handed between the store, the services and the
//! HTTP layer. Row shapes used by `sqlx` live next to their queries in
//! [`crate::db::postgres`].

pub mod account;
pub mod branch;
pub mod customer;
pub mod institution_code;
pub mod session;
pub mod staff_user;
pub mod tenant;

pub use account::{AuthAccount, NewAccount};
pub use branch::{Branch, BranchStatus, BranchSummary, NewBranch};
pub use customer::{CustomerAggregate, CustomerTagAssignment, OrderSummary};
pub use institution_code::{CodeRejection, InstitutionCode, NewInstitutionCode};
pub use session::keys as session_keys;
pub use staff_user::{NewStaffUser, StaffListing, StaffPatch, StaffStatus, StaffUser};
pub use tenant::{NewTenant, Tenant};
