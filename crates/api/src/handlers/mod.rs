pub mod drip;
pub mod onboarding;
