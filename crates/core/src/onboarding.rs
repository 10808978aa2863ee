//! Onboarding profile fields, partial-update patches, and patch validation.
//!
//! A profile is filled in incrementally: every progress write carries a
//! [`ProfilePatch`] with only the fields the client touched, and the stored
//! [`ProfileFields`] are overlaid with it via [`ProfileFields::merge`].

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Maximum length (in characters) of any free-text profile field.
pub const MAX_TEXT_FIELD_LEN: usize = 255;

/// Maximum number of pain points a profile may carry.
pub const MAX_PAIN_POINTS: usize = 20;

// ---------------------------------------------------------------------------
// ProfileFields
// ---------------------------------------------------------------------------

/// The business fields of an onboarding profile, independent of storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
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
}

impl ProfileFields {
    /// Overlay `patch` onto these fields.
    ///
    /// Fields absent from the patch keep their current value. A text field
    /// sent as an empty string is stored as empty and therefore counts as
    /// unfilled when scored.
    pub fn merge(&mut self, patch: &ProfilePatch) {
        fn overlay(slot: &mut Option<String>, incoming: &Option<String>) {
            if let Some(value) = incoming {
                *slot = Some(value.clone());
            }
        }

        overlay(&mut self.business_type, &patch.business_type);
        overlay(&mut self.years_in_operation, &patch.years_in_operation);
        overlay(&mut self.current_credit_score, &patch.current_credit_score);
        overlay(&mut self.ein_number, &patch.ein_number);
        overlay(&mut self.trade_lines, &patch.trade_lines);
        overlay(&mut self.credit_goal, &patch.credit_goal);
        overlay(
            &mut self.preferred_communication,
            &patch.preferred_communication,
        );
        overlay(&mut self.referral_source, &patch.referral_source);
        overlay(&mut self.budget_for_premium, &patch.budget_for_premium);
        overlay(&mut self.team_size, &patch.team_size);
        overlay(&mut self.current_step, &patch.current_step);

        if let Some(uploaded) = patch.ein_uploaded {
            self.ein_uploaded = uploaded;
        }
        if let Some(connected) = patch.bank_connected {
            self.bank_connected = connected;
        }
        if let Some(ref points) = patch.pain_points {
            self.pain_points = points.clone();
        }
    }

    /// Return a copy with `patch` applied.
    pub fn merged(&self, patch: &ProfilePatch) -> Self {
        let mut next = self.clone();
        next.merge(patch);
        next
    }
}

/// Whether an optional text value is present and not blank.
pub fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// ProfilePatch
// ---------------------------------------------------------------------------

/// A partial onboarding-progress update. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[validate(length(max = 255))]
    pub business_type: Option<String>,
    #[validate(length(max = 255))]
    pub years_in_operation: Option<String>,
    #[validate(length(max = 255))]
    pub current_credit_score: Option<String>,
    #[validate(length(max = 255))]
    pub ein_number: Option<String>,
    #[validate(length(max = 255))]
    pub trade_lines: Option<String>,
    #[validate(length(max = 255))]
    pub credit_goal: Option<String>,
    #[validate(length(max = 255))]
    pub preferred_communication: Option<String>,
    #[validate(length(max = 255))]
    pub referral_source: Option<String>,
    #[validate(length(max = 255))]
    pub budget_for_premium: Option<String>,
    #[validate(length(max = 255))]
    pub team_size: Option<String>,
    #[validate(length(max = 255))]
    pub current_step: Option<String>,
    pub ein_uploaded: Option<bool>,
    pub bank_connected: Option<bool>,
    #[validate(length(max = 20), custom(function = "validate_pain_points"))]
    pub pain_points: Option<Vec<String>>,
}

/// Every pain point must be non-blank and within the text length limit.
fn validate_pain_points(points: &[String]) -> Result<(), ValidationError> {
    for point in points {
        if point.trim().is_empty() {
            return Err(ValidationError::new("blank_pain_point"));
        }
        if point.chars().count() > MAX_TEXT_FIELD_LEN {
            return Err(ValidationError::new("pain_point_too_long"));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn patch_json(value: serde_json::Value) -> ProfilePatch {
        serde_json::from_value(value).expect("patch should deserialize")
    }

    #[test]
    fn merge_preserves_absent_fields() {
        let mut fields = ProfileFields {
            business_type: Some("LLC".into()),
            credit_goal: Some("50k line".into()),
            bank_connected: true,
            ..Default::default()
        };

        fields.merge(&patch_json(serde_json::json!({ "einNumber": "12-3456789" })));

        assert_eq!(fields.business_type.as_deref(), Some("LLC"));
        assert_eq!(fields.credit_goal.as_deref(), Some("50k line"));
        assert_eq!(fields.ein_number.as_deref(), Some("12-3456789"));
        assert!(fields.bank_connected);
    }

    #[test]
    fn merge_null_is_treated_as_absent() {
        let mut fields = ProfileFields {
            business_type: Some("LLC".into()),
            ..Default::default()
        };
        fields.merge(&patch_json(serde_json::json!({ "businessType": null })));
        assert_eq!(fields.business_type.as_deref(), Some("LLC"));
    }

    #[test]
    fn merge_empty_string_clears_text() {
        let mut fields = ProfileFields {
            business_type: Some("LLC".into()),
            ..Default::default()
        };
        fields.merge(&patch_json(serde_json::json!({ "businessType": "" })));
        assert_eq!(fields.business_type.as_deref(), Some(""));
        assert!(!is_filled(&fields.business_type));
    }

    #[test]
    fn merge_can_unset_booleans_and_replace_pain_points() {
        let mut fields = ProfileFields {
            ein_uploaded: true,
            pain_points: vec!["cash flow".into()],
            ..Default::default()
        };
        fields.merge(&patch_json(serde_json::json!({
            "einUploaded": false,
            "painPoints": ["approvals", "rates"]
        })));
        assert!(!fields.ein_uploaded);
        assert_eq!(fields.pain_points, vec!["approvals", "rates"]);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let patch = patch_json(serde_json::json!({ "favouriteColour": "teal" }));
        assert!(ProfileFields::default().merged(&patch) == ProfileFields::default());
    }

    #[test]
    fn non_boolean_milestone_is_rejected() {
        let result: Result<ProfilePatch, _> =
            serde_json::from_value(serde_json::json!({ "bankConnected": "yes" }));
        assert!(result.is_err());
    }

    #[test]
    fn is_filled_rejects_blank() {
        assert!(!is_filled(&None));
        assert!(!is_filled(&Some(String::new())));
        assert!(!is_filled(&Some("   ".into())));
        assert!(is_filled(&Some("x".into())));
    }

    #[test]
    fn overlong_text_fails_validation() {
        let patch = ProfilePatch {
            business_type: Some("x".repeat(MAX_TEXT_FIELD_LEN + 1)),
            ..Default::default()
        };
        let errors = patch.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("business_type"));
    }

    #[test]
    fn too_many_pain_points_fail_validation() {
        let patch = ProfilePatch {
            pain_points: Some(vec!["p".to_string(); MAX_PAIN_POINTS + 1]),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn blank_pain_point_fails_validation() {
        let patch = ProfilePatch {
            pain_points: Some(vec!["ok".into(), " ".into()]),
            ..Default::default()
        };
        let errors = patch.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("pain_points"));
    }

    #[test]
    fn empty_patch_is_valid() {
        assert!(ProfilePatch::default().validate().is_ok());
    }
}
