//! Outbound onboarding email for Fundpath.
//!
//! - [`delivery`] -- the [`Mailer`] capability with SMTP and HTTP-API backends.
//! - [`templates`] -- the drip email template set, one typed input per stage.
//! - [`store`] -- the [`DripStore`] seam over profiles and send markers.
//! - [`drip`] -- [`DripScheduler`], which sends every due, unsent stage.

pub mod delivery;
pub mod drip;
pub mod store;
pub mod templates;

pub use delivery::{mailer_from_env, EmailError, Mailer, OutboundEmail, SendReceipt};
pub use drip::{
    DripConfig, DripError, DripRunError, DripRunErrorKind, DripRunSummary, DripScheduler,
};
pub use store::{DripCandidate, DripStore, PgDripStore, RunLease, StoreError};
pub use templates::{DripEmail, Links, RenderedEmail};
