//! Domain logic for the tenant administration console.
//!
//! Everything in this crate is pure: permission resolution, the serialized
//! user payload, list view derivation (filter, sort, paginate) and dialog
//! form validation. Network access lives in `console-client`.

pub mod error;
pub mod listing;
pub mod permissions;
pub mod roles;
pub mod types;
pub mod user;
pub mod user_resource;
pub mod validation;
