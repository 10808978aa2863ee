//! Onboarding drip scheduler.
//!
//! [`DripScheduler::run`] is a single pass over every candidate: each due,
//! unsent stage is rendered, sent, and marked sent right after the send
//! succeeds. Users are processed concurrently up to
//! [`DripConfig::concurrency`]; stages for one user are always sequential.
//!
//! A mailer failure leaves the stage unsent for the next run. A marker write
//! that fails after a successful send means the stage may go out again next
//! run (at-least-once delivery).
//!
//! Runs never overlap. A second `run` on the same scheduler, or any run while
//! the store's run lease is held elsewhere, returns
//! [`DripError::AlreadyRunning`] without sending.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::Instrument;

use fundpath_core::clock::Clock;
use fundpath_core::drip::{
    due_stages, elapsed_days, CheckInVariant, DripStage, NextAction, DAY10_SPLIT_THRESHOLD,
};
use fundpath_core::engagement::{classify, EngagementPolicy, EngagementSignals};
use fundpath_core::onboarding::is_filled;
use fundpath_core::types::{DbId, Timestamp};

use crate::delivery::{Mailer, OutboundEmail};
use crate::store::{DripCandidate, DripStore, RunLease, StoreError};
use crate::templates::{
    CheckInEmail, DocumentUploadEmail, DripEmail, EngagementEmail, Links, NextActionEmail,
    RoadmapEmail, WelcomeEmail, FALLBACK_BUSINESS_TYPE, FALLBACK_NAME,
};

/// Default number of users processed at once.
const DEFAULT_CONCURRENCY: usize = 4;

const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DripConfig {
    /// Base URL for every link embedded in the emails.
    pub app_base_url: String,
    pub concurrency: usize,
    /// Day-7 engagement rule.
    pub engagement: EngagementPolicy,
    /// Completion split for the day-10 check-in.
    pub day10_threshold: i32,
}

impl Default for DripConfig {
    fn default() -> Self {
        Self {
            app_base_url: DEFAULT_APP_BASE_URL.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            engagement: EngagementPolicy::default(),
            day10_threshold: DAY10_SPLIT_THRESHOLD,
        }
    }
}

impl DripConfig {
    /// Load drip settings from environment variables.
    ///
    /// | Env var                       | Default                  |
    /// |-------------------------------|--------------------------|
    /// | `APP_BASE_URL`                | `http://localhost:3000`  |
    /// | `DRIP_CONCURRENCY`            | `4`                      |
    /// | `DRIP_ENGAGEMENT_THRESHOLD`   | `50`                     |
    /// | `DRIP_DAY10_THRESHOLD`        | `50`                     |
    /// | `DRIP_ACTIVITY_WINDOW_HOURS`  | unset (rule disabled)    |
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let app_base_url =
            std::env::var("APP_BASE_URL").unwrap_or_else(|_| defaults.app_base_url.clone());

        let concurrency: usize = std::env::var("DRIP_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.concurrency);

        let high_threshold: i32 = std::env::var("DRIP_ENGAGEMENT_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.engagement.high_threshold);

        let recent_activity_window = std::env::var("DRIP_ACTIVITY_WINDOW_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .map(chrono::Duration::hours);

        let day10_threshold: i32 = std::env::var("DRIP_DAY10_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.day10_threshold);

        Self {
            app_base_url,
            concurrency,
            engagement: EngagementPolicy {
                high_threshold,
                recent_activity_window,
            },
            day10_threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Fatal run failure. Per-user failures are reported in [`DripRunSummary`].
#[derive(Debug, thiserror::Error)]
pub enum DripError {
    #[error("Drip store error: {0}")]
    Store(#[from] StoreError),

    #[error("A drip run is already in progress")]
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DripRunErrorKind {
    /// The mailer rejected the send. The stage stays unsent.
    Delivery,
    /// The email went out but the sent marker could not be written.
    Persistence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DripRunError {
    pub user_id: DbId,
    pub stage: DripStage,
    pub kind: DripRunErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DripRunSummary {
    /// Candidates examined.
    pub processed: usize,
    /// Emails handed to the mailer successfully.
    pub sent: usize,
    /// Candidates with nothing due.
    pub skipped: usize,
    pub errors: Vec<DripRunError>,
    /// At least one send was attempted and none succeeded.
    pub all_failed: bool,
}

/// Result of processing one candidate.
#[derive(Debug, Default)]
struct UserOutcome {
    attempted: usize,
    sent: usize,
    skipped: bool,
    error: Option<DripRunError>,
}

// ---------------------------------------------------------------------------
// DripScheduler
// ---------------------------------------------------------------------------

pub struct DripScheduler {
    store: Arc<dyn DripStore>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    config: DripConfig,
    links: Links,
    running: Mutex<()>,
}

impl DripScheduler {
    pub fn new(
        store: Arc<dyn DripStore>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: DripConfig,
    ) -> Self {
        let links = Links::new(config.app_base_url.clone());
        Self {
            store,
            mailer,
            clock,
            config,
            links,
            running: Mutex::new(()),
        }
    }

    /// Current time on the scheduler's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Send every due, unsent stage to every candidate.
    ///
    /// Returns `Err` only if the run cannot start: another run is in
    /// progress, or the store fails to grant the lease or list candidates.
    pub async fn run(&self) -> Result<DripRunSummary, DripError> {
        let Ok(_running) = self.running.try_lock() else {
            tracing::warn!("Drip run skipped: this process is already running one");
            return Err(DripError::AlreadyRunning);
        };
        let Some(lease) = self.store.try_acquire_run().await? else {
            tracing::warn!("Drip run skipped: another instance holds the run lock");
            return Err(DripError::AlreadyRunning);
        };

        let span = tracing::info_span!("drip_run");
        let result = self.run_inner().instrument(span).await;

        if let Err(e) = lease.release().await {
            tracing::warn!(error = %e, "Failed to release drip run lock");
        }
        result
    }

    async fn run_inner(&self) -> Result<DripRunSummary, DripError> {
        let candidates = self.store.list_candidates().await?;
        let now = self.clock.now();

        tracing::info!(candidates = candidates.len(), "Drip run started");

        let outcomes: Vec<UserOutcome> = stream::iter(candidates)
            .map(|candidate| self.process_user(candidate, now))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut summary = DripRunSummary {
            processed: outcomes.len(),
            ..Default::default()
        };
        let mut attempted = 0;
        for outcome in outcomes {
            attempted += outcome.attempted;
            summary.sent += outcome.sent;
            if outcome.skipped {
                summary.skipped += 1;
            }
            if let Some(error) = outcome.error {
                summary.errors.push(error);
            }
        }
        // Completion order under concurrency is arbitrary.
        summary.errors.sort_by_key(|e| (e.user_id, e.stage));
        summary.all_failed = attempted > 0 && summary.sent == 0;

        if summary.all_failed {
            tracing::error!(attempted, "Drip run: every send failed");
        }
        tracing::info!(
            processed = summary.processed,
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "Drip run finished"
        );

        Ok(summary)
    }

    /// Walk one user's due stages in order, stopping at the first failure.
    async fn process_user(&self, candidate: DripCandidate, now: Timestamp) -> UserOutcome {
        let user_id = candidate.user_id;
        let elapsed = elapsed_days(candidate.profile_created_at, now);
        let due = due_stages(elapsed, &candidate.markers);

        if due.is_empty() {
            tracing::debug!(user_id, elapsed_days = elapsed, "No drip stage due");
            return UserOutcome {
                skipped: true,
                ..Default::default()
            };
        }

        let mut outcome = UserOutcome::default();

        for stage in due {
            let rendered = self.compose(stage, &candidate, now).render();
            let email = OutboundEmail {
                to: candidate.email.clone(),
                subject: rendered.subject,
                html: rendered.html,
            };

            outcome.attempted += 1;
            let receipt = match self.mailer.send(&email).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    tracing::warn!(
                        user_id,
                        stage = %stage,
                        error = %e,
                        "Drip email delivery failed"
                    );
                    outcome.error = Some(DripRunError {
                        user_id,
                        stage,
                        kind: DripRunErrorKind::Delivery,
                        message: e.to_string(),
                    });
                    break;
                }
            };
            outcome.sent += 1;

            let sent_at = self.clock.now();
            match self
                .store
                .mark_sent(user_id, stage, receipt.message_id.as_deref(), sent_at)
                .await
            {
                Ok(true) => {
                    tracing::debug!(user_id, stage = %stage, "Drip email sent");
                }
                // Only reachable if a marker was written outside any run lease.
                Ok(false) => {
                    tracing::warn!(user_id, stage = %stage, "Drip stage was already marked");
                }
                Err(e) => {
                    tracing::error!(
                        user_id,
                        stage = %stage,
                        error = %e,
                        "Drip email sent but marker not saved; it may be re-sent"
                    );
                    outcome.error = Some(DripRunError {
                        user_id,
                        stage,
                        kind: DripRunErrorKind::Persistence,
                        message: e.to_string(),
                    });
                    break;
                }
            }
        }

        outcome
    }

    /// Build the email for `stage` from the candidate's current profile.
    fn compose(&self, stage: DripStage, candidate: &DripCandidate, now: Timestamp) -> DripEmail {
        let name = display_name(candidate.name.as_deref());
        let business_type = if is_filled(&candidate.profile.business_type) {
            candidate
                .profile
                .business_type
                .as_deref()
                .unwrap_or(FALLBACK_BUSINESS_TYPE)
                .trim()
                .to_string()
        } else {
            FALLBACK_BUSINESS_TYPE.to_string()
        };

        match stage {
            DripStage::Welcome => DripEmail::Welcome(WelcomeEmail {
                name,
                dashboard_url: self.links.dashboard(),
            }),
            DripStage::Day1 => DripEmail::Day1(DocumentUploadEmail {
                name,
                business_type,
                upload_url: self.links.upload(),
            }),
            DripStage::Day2 => {
                let action = NextAction::for_profile(&candidate.profile);
                DripEmail::Day2(NextActionEmail {
                    name,
                    business_type,
                    action_url: self.links.action(action),
                    action_needed: action,
                })
            }
            DripStage::Day4 => DripEmail::Day4(RoadmapEmail {
                name,
                business_type,
                roadmap_url: self.links.roadmap(),
                consult_url: self.links.consult(),
            }),
            DripStage::Day7 => {
                let engagement = classify(
                    &EngagementSignals {
                        completion_percentage: candidate.completion_percentage,
                        last_profile_update: Some(candidate.profile_updated_at),
                        now,
                    },
                    &self.config.engagement,
                );
                DripEmail::Day7(EngagementEmail {
                    name,
                    webinar_url: self.links.webinar(),
                    upgrade_url: self.links.upgrade(),
                    is_high_engagement: engagement.is_high(),
                })
            }
            DripStage::Day10 => DripEmail::Day10(CheckInEmail {
                name,
                support_url: self.links.support(),
                book_demo_url: self.links.book_demo(),
                completion_percentage: candidate.completion_percentage,
                variant: CheckInVariant::for_completion(
                    candidate.completion_percentage,
                    self.config.day10_threshold,
                ),
            }),
        }
    }
}

fn display_name(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => FALLBACK_NAME.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
