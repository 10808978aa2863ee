//! Persistence seam for the drip scheduler.
//!
//! [`DripScheduler`](crate::DripScheduler) reads candidates and records sends
//! through [`DripStore`] only. [`PgDripStore`] implements it on the Postgres
//! repositories; tests use an in-memory store.
//!
//! A run holds a [`RunLease`] from start to finish. The Postgres lease is an
//! advisory lock, so runs in separate processes never overlap.

use std::collections::HashMap;

use async_trait::async_trait;
use fundpath_core::drip::{DripMarkers, DripStage};
use fundpath_core::onboarding::ProfileFields;
use fundpath_core::types::{DbId, Timestamp};
use fundpath_db::models::drip_send::{markers_from_rows, DripSend};
use fundpath_db::repositories::{DripSendRepo, OnboardingProfileRepo, UserRepo};
use fundpath_db::DbPool;
use sqlx::{Postgres, Transaction};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database backend failure (used by alternative stores).
    #[error("Store error: {0}")]
    Backend(String),
}

/// Everything the scheduler needs to decide and compose a user's emails.
#[derive(Debug, Clone)]
pub struct DripCandidate {
    pub user_id: DbId,
    pub email: String,
    pub name: Option<String>,
    pub profile: ProfileFields,
    pub completion_percentage: i32,
    /// Anchor for elapsed-day calculations.
    pub profile_created_at: Timestamp,
    pub profile_updated_at: Timestamp,
    pub markers: DripMarkers,
}

/// Exclusive right to run the scheduler, held until released.
#[async_trait]
pub trait RunLease: Send {
    async fn release(self: Box<Self>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DripStore: Send + Sync {
    /// Claim the run. Returns `None` if another run holds it.
    async fn try_acquire_run(&self) -> Result<Option<Box<dyn RunLease>>, StoreError>;

    /// Users who may still have unsent stages, with their current profile
    /// and send markers.
    async fn list_candidates(&self) -> Result<Vec<DripCandidate>, StoreError>;

    /// Record a send. Returns `false` if the marker already existed.
    async fn mark_sent(
        &self,
        user_id: DbId,
        stage: DripStage,
        message_id: Option<&str>,
        sent_at: Timestamp,
    ) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

pub struct PgDripStore {
    pool: DbPool,
}

impl PgDripStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Holds the transaction that owns the advisory lock. Dropping it without
/// `release` still rolls back, which frees the lock.
struct PgRunLease {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RunLease for PgRunLease {
    async fn release(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl DripStore for PgDripStore {
    async fn try_acquire_run(&self) -> Result<Option<Box<dyn RunLease>>, StoreError> {
        let mut tx = self.pool.begin().await?;
        if DripSendRepo::try_lock_run(&mut tx).await? {
            Ok(Some(Box::new(PgRunLease { tx })))
        } else {
            tx.rollback().await?;
            Ok(None)
        }
    }

    async fn list_candidates(&self) -> Result<Vec<DripCandidate>, StoreError> {
        let users = UserRepo::list_drip_candidates(&self.pool).await?;
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<DbId> = users.iter().map(|u| u.id).collect();
        let mut profiles: HashMap<DbId, _> =
            OnboardingProfileRepo::list_by_users(&self.pool, &ids)
                .await?
                .into_iter()
                .map(|p| (p.user_id, p))
                .collect();

        let mut sends: HashMap<DbId, Vec<DripSend>> = HashMap::new();
        for row in DripSendRepo::list_for_users(&self.pool, &ids).await? {
            sends.entry(row.user_id).or_default().push(row);
        }

        let candidates = users
            .into_iter()
            .filter_map(|user| {
                // The candidate query joins on the profile, but it may have
                // been deleted between the two reads.
                let profile = profiles.remove(&user.id)?;
                let rows = sends.remove(&user.id).unwrap_or_default();
                Some(DripCandidate {
                    user_id: user.id,
                    email: user.email,
                    name: user.name,
                    profile: profile.fields(),
                    completion_percentage: profile.completion_percentage,
                    profile_created_at: profile.created_at,
                    profile_updated_at: profile.updated_at,
                    markers: markers_from_rows(&rows),
                })
            })
            .collect();

        Ok(candidates)
    }

    async fn mark_sent(
        &self,
        user_id: DbId,
        stage: DripStage,
        message_id: Option<&str>,
        sent_at: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(DripSendRepo::mark_sent(&self.pool, user_id, stage, message_id, sent_at).await?)
    }
}
