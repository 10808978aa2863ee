//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row, plus any insert DTOs the repositories accept.

pub mod drip_send;
pub mod onboarding_profile;
pub mod user;
