//! Pure domain logic for the onboarding drip service.
//!
//! Nothing in this crate performs I/O. The database, mailer and HTTP layers
//! live in `fundpath-db`, `fundpath-events` and `fundpath-api` and feed this
//! crate pre-loaded values.

pub mod clock;
pub mod completion;
pub mod drip;
pub mod engagement;
pub mod error;
pub mod onboarding;
pub mod types;
