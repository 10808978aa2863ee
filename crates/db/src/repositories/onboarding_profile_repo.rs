//! Repository for the `onboarding_profiles` table.

use fundpath_core::completion;
use fundpath_core::onboarding::{ProfileFields, ProfilePatch};
use fundpath_core::types::DbId;
use sqlx::PgPool;

use crate::models::onboarding_profile::OnboardingProfile;

/// Column list for `onboarding_profiles` queries.
const COLUMNS: &str = "\
    id, user_id, business_type, years_in_operation, current_credit_score, \
    ein_number, trade_lines, credit_goal, preferred_communication, \
    referral_source, budget_for_premium, team_size, current_step, \
    ein_uploaded, bank_connected, pain_points, completion_percentage, \
    created_at, updated_at";

/// Provides read and merge-update operations for onboarding profiles.
pub struct OnboardingProfileRepo;

impl OnboardingProfileRepo {
    /// Get the profile for a user, if one exists.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<OnboardingProfile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM onboarding_profiles WHERE user_id = $1");
        sqlx::query_as::<_, OnboardingProfile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Get the profiles for a batch of users.
    pub async fn list_by_users(
        pool: &PgPool,
        user_ids: &[DbId],
    ) -> Result<Vec<OnboardingProfile>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM onboarding_profiles WHERE user_id = ANY($1) ORDER BY user_id"
        );
        sqlx::query_as::<_, OnboardingProfile>(&query)
            .bind(user_ids)
            .fetch_all(pool)
            .await
    }

    /// Merge `patch` into the user's profile and rescore it, creating the
    /// profile on first write.
    ///
    /// The read, merge, score and write happen in one transaction with the
    /// existing row locked, so concurrent progress writes for the same user
    /// cannot lose each other's fields or leave a stale completion score.
    pub async fn apply_patch(
        pool: &PgPool,
        user_id: DbId,
        patch: &ProfilePatch,
    ) -> Result<OnboardingProfile, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Make sure a row exists to lock. A fresh row starts from defaults.
        sqlx::query(
            "INSERT INTO onboarding_profiles (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let select = format!(
            "SELECT {COLUMNS} FROM onboarding_profiles WHERE user_id = $1 FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, OnboardingProfile>(&select)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        let merged = existing.fields().merged(patch);
        let completion = completion::score(&merged);

        let updated = Self::write_fields(&mut tx, user_id, &merged, completion).await?;

        tx.commit().await?;

        tracing::debug!(
            user_id,
            completion_before = existing.completion_percentage,
            completion_after = completion,
            "Onboarding profile merged"
        );

        Ok(updated)
    }

    /// Overwrite every profile column together with the completion score
    /// derived from them. `created_at` is left untouched.
    async fn write_fields(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: DbId,
        fields: &ProfileFields,
        completion_percentage: i32,
    ) -> Result<OnboardingProfile, sqlx::Error> {
        let query = format!(
            "UPDATE onboarding_profiles SET \
                business_type = $2, years_in_operation = $3, current_credit_score = $4, \
                ein_number = $5, trade_lines = $6, credit_goal = $7, \
                preferred_communication = $8, referral_source = $9, \
                budget_for_premium = $10, team_size = $11, current_step = $12, \
                ein_uploaded = $13, bank_connected = $14, pain_points = $15, \
                completion_percentage = $16, updated_at = NOW() \
             WHERE user_id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OnboardingProfile>(&query)
            .bind(user_id)
            .bind(&fields.business_type)
            .bind(&fields.years_in_operation)
            .bind(&fields.current_credit_score)
            .bind(&fields.ein_number)
            .bind(&fields.trade_lines)
            .bind(&fields.credit_goal)
            .bind(&fields.preferred_communication)
            .bind(&fields.referral_source)
            .bind(&fields.budget_for_premium)
            .bind(&fields.team_size)
            .bind(&fields.current_step)
            .bind(fields.ein_uploaded)
            .bind(fields.bank_connected)
            .bind(&fields.pain_points)
            .bind(completion_percentage)
            .fetch_one(&mut **tx)
            .await
    }
}
