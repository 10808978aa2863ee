//! Repository for the `users` table.

use fundpath_core::drip::DripStage;
use fundpath_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, name, is_active, drip_unsubscribed_at, created_at, updated_at";

/// Same columns qualified with the `u` alias for joined queries.
const QUALIFIED_COLUMNS: &str = "u.id, u.email, u.name, u.is_active, u.drip_unsubscribed_at, \
                                 u.created_at, u.updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Opt a user out of (or back into) onboarding drip emails.
    ///
    /// Returns `true` if a user row was updated.
    pub async fn set_drip_unsubscribed(
        pool: &PgPool,
        id: DbId,
        unsubscribed: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users \
             SET drip_unsubscribed_at = CASE WHEN $2 THEN COALESCE(drip_unsubscribed_at, NOW()) END, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(unsubscribed)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deactivate a user. Inactive users receive no drip emails.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List users who may still have drip stages to receive.
    ///
    /// A candidate is active, not unsubscribed, has an onboarding profile, and
    /// has fewer sent markers than there are stages.
    pub async fn list_drip_candidates(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM users u \
             JOIN onboarding_profiles p ON p.user_id = u.id \
             WHERE u.is_active \
               AND u.drip_unsubscribed_at IS NULL \
               AND (SELECT COUNT(*) FROM drip_email_sends s WHERE s.user_id = u.id) < $1 \
             ORDER BY u.id"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(DripStage::ALL.len() as i64)
            .fetch_all(pool)
            .await
    }
}
