//! Repository for the `drip_email_sends` table.

use fundpath_core::drip::DripStage;
use fundpath_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::drip_send::DripSend;

/// Column list for `drip_email_sends` queries.
const COLUMNS: &str = "id, user_id, stage, message_id, sent_at";

/// Advisory lock key that serializes drip runs across processes.
pub const DRIP_RUN_LOCK_KEY: i64 = 0x4650_4452_4950;

/// Reads and writes drip send markers.
pub struct DripSendRepo;

impl DripSendRepo {
    /// All send markers for one user, in send order.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<DripSend>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM drip_email_sends WHERE user_id = $1 ORDER BY sent_at, id"
        );
        sqlx::query_as::<_, DripSend>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// All send markers for a batch of users.
    pub async fn list_for_users(
        pool: &PgPool,
        user_ids: &[DbId],
    ) -> Result<Vec<DripSend>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM drip_email_sends WHERE user_id = ANY($1) ORDER BY user_id, sent_at"
        );
        sqlx::query_as::<_, DripSend>(&query)
            .bind(user_ids)
            .fetch_all(pool)
            .await
    }

    /// Record that `stage` was sent to `user_id`.
    ///
    /// The insert only happens if no marker exists yet. Returns `true` if
    /// this call created the marker and `false` if another run recorded it
    /// first.
    pub async fn mark_sent(
        pool: &PgPool,
        user_id: DbId,
        stage: DripStage,
        message_id: Option<&str>,
        sent_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO drip_email_sends (user_id, stage, message_id, sent_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, stage) DO NOTHING",
        )
        .bind(user_id)
        .bind(stage.as_str())
        .bind(message_id)
        .bind(sent_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Try to take the drip run lock on `conn`.
    ///
    /// The lock is transaction-scoped: `conn` must be inside a transaction,
    /// and the lock is released when that transaction ends. Returns `false`
    /// if another session holds it.
    pub async fn try_lock_run(conn: &mut PgConnection) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(DRIP_RUN_LOCK_KEY)
            .fetch_one(conn)
            .await
    }
}
