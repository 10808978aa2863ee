//! Onboarding completion scoring.
//!
//! The score counts eight tracked signals: six free-text fields and two
//! milestone booleans. Scoring is total and never fails. Callers must score
//! the merged profile, never a bare patch.

use crate::onboarding::{is_filled, ProfileFields};

/// Number of tracked signals.
pub const TOTAL_SIGNALS: u32 = 8;

/// Count how many tracked signals `fields` fills.
pub fn filled_signals(fields: &ProfileFields) -> u32 {
    let text = [
        &fields.business_type,
        &fields.years_in_operation,
        &fields.current_credit_score,
        &fields.ein_number,
        &fields.credit_goal,
        &fields.preferred_communication,
    ];
    let milestones = [fields.ein_uploaded, fields.bank_connected];

    let text_filled = text.iter().filter(|v| is_filled(v)).count();
    let milestones_filled = milestones.iter().filter(|m| **m).count();

    (text_filled + milestones_filled) as u32
}

/// Completion percentage in `[0, 100]`, rounded half away from zero.
pub fn score(fields: &ProfileFields) -> i32 {
    let filled = filled_signals(fields);
    ((100.0 * f64::from(filled)) / f64::from(TOTAL_SIGNALS)).round() as i32
}
