//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod drip_send_repo;
pub mod onboarding_profile_repo;
pub mod user_repo;

pub use drip_send_repo::DripSendRepo;
pub use onboarding_profile_repo::OnboardingProfileRepo;
pub use user_repo::UserRepo;
