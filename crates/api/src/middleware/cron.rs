//! Shared-secret guard for scheduler trigger endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use fundpath_core::error::CoreError;

use crate::error::AppError;
use crate::middleware::bearer_token;
use crate::state::AppState;

/// Proof that the caller presented `Authorization: Bearer <CRON_SECRET>`.
///
/// With no `CRON_SECRET` configured every request is rejected.
#[derive(Debug, Clone, Copy)]
pub struct CronAuth;

impl FromRequestParts<AppState> for CronAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.cron_secret.as_deref() else {
            tracing::warn!("Cron trigger called but CRON_SECRET is not configured");
            return Err(unauthorized());
        };

        let presented = bearer_token(parts)?;
        if !constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            tracing::warn!("Cron trigger called with an invalid secret");
            return Err(unauthorized());
        }

        Ok(CronAuth)
    }
}

fn unauthorized() -> AppError {
    AppError::Core(CoreError::Unauthorized("Invalid cron secret".into()))
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_only_identical_input() {
        assert!(constant_time_eq(b"s3cret", b"s3cret"));
        assert!(!constant_time_eq(b"s3cret", b"s3creT"));
        assert!(!constant_time_eq(b"s3cret", b"s3cret-longer"));
        assert!(!constant_time_eq(b"", b"x"));
    }
}
