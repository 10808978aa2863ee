//! Drip send marker model (one row per user and stage).

use fundpath_core::drip::{DripMarkers, DripStage};
use fundpath_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `drip_email_sends` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DripSend {
    #[serde(skip)]
    pub id: DbId,
    #[serde(skip)]
    pub user_id: DbId,
    pub stage: String,
    pub message_id: Option<String>,
    pub sent_at: Timestamp,
}

/// Fold send rows into a marker map, skipping rows with unknown stage ids.
pub fn markers_from_rows(rows: &[DripSend]) -> DripMarkers {
    rows.iter()
        .filter_map(|row| match DripStage::from_str_value(&row.stage) {
            Ok(stage) => Some((stage, row.sent_at)),
            Err(e) => {
                tracing::warn!(user_id = row.user_id, error = %e, "Ignoring drip send row");
                None
            }
        })
        .collect()
}
