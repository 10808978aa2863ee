//! Onboarding drip stages and the pure logic that decides what is due.
//!
//! Stages form a closed, ordered set anchored on the profile's creation
//! time. A stage becomes due once its day offset has elapsed, and it stays
//! due until a sent marker exists for it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::onboarding::{is_filled, ProfileFields};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Stage ids
// ---------------------------------------------------------------------------

pub const STAGE_WELCOME: &str = "welcome";
pub const STAGE_DAY1: &str = "day1";
pub const STAGE_DAY2: &str = "day2";
pub const STAGE_DAY4: &str = "day4";
pub const STAGE_DAY7: &str = "day7";
pub const STAGE_DAY10: &str = "day10";

/// Completion percentage at which day 10 switches from the support offer to
/// the strategy-session invitation.
pub const DAY10_SPLIT_THRESHOLD: i32 = 50;

// ---------------------------------------------------------------------------
// DripStage
// ---------------------------------------------------------------------------

/// A single scheduled onboarding email.
///
/// Variant order is send order; `Ord` follows declaration order so the
/// stage list and marker maps iterate by ascending offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DripStage {
    Welcome,
    Day1,
    Day2,
    Day4,
    Day7,
    Day10,
}

impl DripStage {
    /// Every stage, in ascending offset order.
    pub const ALL: [DripStage; 6] = [
        DripStage::Welcome,
        DripStage::Day1,
        DripStage::Day2,
        DripStage::Day4,
        DripStage::Day7,
        DripStage::Day10,
    ];

    /// Whole days after profile creation at which the stage becomes due.
    pub fn offset_days(self) -> i64 {
        match self {
            Self::Welcome => 0,
            Self::Day1 => 1,
            Self::Day2 => 2,
            Self::Day4 => 4,
            Self::Day7 => 7,
            Self::Day10 => 10,
        }
    }

    /// Convert to the database string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => STAGE_WELCOME,
            Self::Day1 => STAGE_DAY1,
            Self::Day2 => STAGE_DAY2,
            Self::Day4 => STAGE_DAY4,
            Self::Day7 => STAGE_DAY7,
            Self::Day10 => STAGE_DAY10,
        }
    }

    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, String> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|st| st.as_str()).collect();
                format!("Invalid drip stage '{s}'. Must be one of: {}", valid.join(", "))
            })
    }
}

impl std::fmt::Display for DripStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sent markers
// ---------------------------------------------------------------------------

/// Per-user record of which stages have been sent and when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DripMarkers {
    sent: BTreeMap<DripStage, Timestamp>,
}

impl DripMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sent(&self, stage: DripStage) -> bool {
        self.sent.contains_key(&stage)
    }

    /// Record a send. An existing marker is kept, so the first timestamp wins.
    pub fn mark(&mut self, stage: DripStage, at: Timestamp) {
        self.sent.entry(stage).or_insert(at);
    }

    /// `true` once every stage has a marker.
    pub fn is_drained(&self) -> bool {
        self.sent.len() == DripStage::ALL.len()
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DripStage, Timestamp)> + '_ {
        self.sent.iter().map(|(s, t)| (*s, *t))
    }
}

impl FromIterator<(DripStage, Timestamp)> for DripMarkers {
    fn from_iter<I: IntoIterator<Item = (DripStage, Timestamp)>>(iter: I) -> Self {
        let mut markers = Self::new();
        for (stage, at) in iter {
            markers.mark(stage, at);
        }
        markers
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// Whole days elapsed since `created_at`. A creation time in the future
/// (clock skew) counts as zero.
pub fn elapsed_days(created_at: Timestamp, now: Timestamp) -> i64 {
    (now - created_at).num_days().max(0)
}

/// Unsent stages whose offset has elapsed, in ascending offset order.
pub fn due_stages(elapsed_days: i64, markers: &DripMarkers) -> Vec<DripStage> {
    DripStage::ALL
        .into_iter()
        .filter(|stage| stage.offset_days() <= elapsed_days && !markers.is_sent(*stage))
        .collect()
}

// ---------------------------------------------------------------------------
// Branch inputs
// ---------------------------------------------------------------------------

/// The single next action promoted by the day-2 email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    ConnectBank,
    AddTradelines,
    SetGoals,
}

impl NextAction {
    /// Pick the first missing milestone in priority order: bank connection,
    /// then trade lines, then goal setting. A profile with every milestone in
    /// place is pointed at its goals.
    pub fn for_profile(fields: &ProfileFields) -> Self {
        if !fields.bank_connected {
            Self::ConnectBank
        } else if !is_filled(&fields.trade_lines) {
            Self::AddTradelines
        } else {
            Self::SetGoals
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectBank => "connect_bank",
            Self::AddTradelines => "add_tradelines",
            Self::SetGoals => "set_goals",
        }
    }
}

/// Which day-10 check-in the user receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInVariant {
    /// Below the split threshold: offer hands-on help finishing setup.
    SupportOffer,
    /// At or above it: invite the user to a strategy session.
    StrategySession,
}

impl CheckInVariant {
    pub fn for_completion(completion_percentage: i32, threshold: i32) -> Self {
        if completion_percentage >= threshold {
            Self::StrategySession
        } else {
            Self::SupportOffer
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 1, 5, 8, 30, 0).unwrap()
    }

    #[test]
    fn stage_ids_round_trip() {
        for stage in DripStage::ALL {
            assert_eq!(DripStage::from_str_value(stage.as_str()), Ok(stage));
        }
        assert!(DripStage::from_str_value("day3").is_err());
    }

    #[test]
    fn stages_are_ordered_by_offset() {
        let offsets: Vec<i64> = DripStage::ALL.iter().map(|s| s.offset_days()).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
        assert!(DripStage::Welcome < DripStage::Day10);
    }

    #[test]
    fn elapsed_days_floors_partial_days() {
        assert_eq!(elapsed_days(t0(), t0()), 0);
        assert_eq!(elapsed_days(t0(), t0() + Duration::hours(23)), 0);
        assert_eq!(elapsed_days(t0(), t0() + Duration::hours(24)), 1);
        assert_eq!(elapsed_days(t0(), t0() + Duration::days(7) - Duration::seconds(1)), 6);
    }

    #[test]
    fn elapsed_days_clamps_future_creation() {
        assert_eq!(elapsed_days(t0(), t0() - Duration::days(2)), 0);
    }

    #[test]
    fn welcome_due_immediately() {
        assert_eq!(due_stages(0, &DripMarkers::new()), vec![DripStage::Welcome]);
    }

    #[test]
    fn catch_up_returns_all_due_in_order() {
        assert_eq!(due_stages(10, &DripMarkers::new()), DripStage::ALL.to_vec());
        assert_eq!(
            due_stages(5, &DripMarkers::new()),
            vec![
                DripStage::Welcome,
                DripStage::Day1,
                DripStage::Day2,
                DripStage::Day4
            ]
        );
    }

    #[test]
    fn sent_stages_are_not_due() {
        let markers: DripMarkers = [(DripStage::Welcome, t0()), (DripStage::Day2, t0())]
            .into_iter()
            .collect();
        assert_eq!(
            due_stages(4, &markers),
            vec![DripStage::Day1, DripStage::Day4]
        );
    }

    #[test]
    fn markers_keep_first_timestamp() {
        let mut markers = DripMarkers::new();
        markers.mark(DripStage::Welcome, t0());
        markers.mark(DripStage::Welcome, t0() + Duration::days(1));
        assert_eq!(
            markers.iter().collect::<Vec<_>>(),
            vec![(DripStage::Welcome, t0())]
        );
        assert_eq!(markers.len(), 1);
    }

    #[test]
    fn drained_once_all_marked() {
        let markers: DripMarkers = DripStage::ALL.into_iter().map(|s| (s, t0())).collect();
        assert!(markers.is_drained());
        assert!(due_stages(30, &markers).is_empty());
    }

    #[test]
    fn next_action_prefers_bank_connection() {
        let fields = ProfileFields {
            trade_lines: Some("3 net-30 accounts".into()),
            bank_connected: false,
            ..Default::default()
        };
        assert_eq!(NextAction::for_profile(&fields), NextAction::ConnectBank);
    }

    #[test]
    fn next_action_then_trade_lines_then_goals() {
        let mut fields = ProfileFields {
            bank_connected: true,
            ..Default::default()
        };
        assert_eq!(NextAction::for_profile(&fields), NextAction::AddTradelines);

        fields.trade_lines = Some("2".into());
        assert_eq!(NextAction::for_profile(&fields), NextAction::SetGoals);

        fields.credit_goal = Some("SBA loan".into());
        assert_eq!(NextAction::for_profile(&fields), NextAction::SetGoals);
    }

    #[test]
    fn check_in_splits_at_threshold() {
        assert_eq!(
            CheckInVariant::for_completion(49, DAY10_SPLIT_THRESHOLD),
            CheckInVariant::SupportOffer
        );
        assert_eq!(
            CheckInVariant::for_completion(50, DAY10_SPLIT_THRESHOLD),
            CheckInVariant::StrategySession
        );
    }
}
