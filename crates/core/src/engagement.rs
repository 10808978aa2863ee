//! Engagement classification used at the day-7 branch point.
//!
//! The default rule looks only at completion: a user at or above
//! [`HIGH_ENGAGEMENT_THRESHOLD`] percent is [`Engagement::High`]. An optional
//! recent-activity window can promote partially complete users who are still
//! actively filling in their profile.

use serde::Serialize;

use crate::types::Timestamp;

/// Completion percentage at or above which a user is highly engaged.
pub const HIGH_ENGAGEMENT_THRESHOLD: i32 = 50;

/// Minimum completion for the recent-activity rule to apply.
pub const RECENT_ACTIVITY_MIN_COMPLETION: i32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    High,
    Low,
}

impl Engagement {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

/// Tunable classification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementPolicy {
    pub high_threshold: i32,
    /// When set, users whose profile changed within this window count as
    /// highly engaged once they reach [`RECENT_ACTIVITY_MIN_COMPLETION`].
    pub recent_activity_window: Option<chrono::Duration>,
}

impl Default for EngagementPolicy {
    fn default() -> Self {
        Self {
            high_threshold: HIGH_ENGAGEMENT_THRESHOLD,
            recent_activity_window: None,
        }
    }
}

/// Activity signals available at send time.
#[derive(Debug, Clone, Copy)]
pub struct EngagementSignals {
    pub completion_percentage: i32,
    pub last_profile_update: Option<Timestamp>,
    pub now: Timestamp,
}

pub fn classify(signals: &EngagementSignals, policy: &EngagementPolicy) -> Engagement {
    if signals.completion_percentage >= policy.high_threshold {
        return Engagement::High;
    }

    if let (Some(window), Some(updated)) =
        (policy.recent_activity_window, signals.last_profile_update)
    {
        let recent = signals.now - updated <= window;
        if recent && signals.completion_percentage >= RECENT_ACTIVITY_MIN_COMPLETION {
            return Engagement::High;
        }
    }

    Engagement::Low
}
