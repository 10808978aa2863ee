//! Onboarding profile entity model.

use fundpath_core::onboarding::ProfileFields;
use fundpath_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `onboarding_profiles` table.
///
/// `completion_percentage` is derived from the other columns and is only
/// written by [`crate::repositories::OnboardingProfileRepo::apply_patch`].
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingProfile {
    pub id: DbId,
    pub user_id: DbId,
    pub business_type: Option<String>,
    pub years_in_operation: Option<String>,
    pub current_credit_score: Option<String>,
    pub ein_number: Option<String>,
    pub trade_lines: Option<String>,
    pub credit_goal: Option<String>,
    pub preferred_communication: Option<String>,
    pub referral_source: Option<String>,
    pub budget_for_premium: Option<String>,
    pub team_size: Option<String>,
    pub current_step: Option<String>,
    pub ein_uploaded: bool,
    pub bank_connected: bool,
    pub pain_points: Vec<String>,
    pub completion_percentage: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OnboardingProfile {
    /// Extract the business fields for merging and scoring.
    pub fn fields(&self) -> ProfileFields {
        ProfileFields {
            business_type: self.business_type.clone(),
            years_in_operation: self.years_in_operation.clone(),
            current_credit_score: self.current_credit_score.clone(),
            ein_number: self.ein_number.clone(),
            trade_lines: self.trade_lines.clone(),
            credit_goal: self.credit_goal.clone(),
            preferred_communication: self.preferred_communication.clone(),
            referral_source: self.referral_source.clone(),
            budget_for_premium: self.budget_for_premium.clone(),
            team_size: self.team_size.clone(),
            current_step: self.current_step.clone(),
            ein_uploaded: self.ein_uploaded,
            bank_connected: self.bank_connected,
            pain_points: self.pain_points.clone(),
        }
    }
}
