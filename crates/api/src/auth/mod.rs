//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token validation and generation.

pub mod jwt;
