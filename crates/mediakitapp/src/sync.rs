//! # Sync Verifier
//!
//! Detects drift between two related entities (typically topics and the
//! questions generated from them) by comparing their last-modified stamps.
//! Stamps within the tolerance window count as in sync; anything else gets
//! an explicit issue and a recommendation for which side to regenerate.
//!
//! A missing stamp is itself drift: the entity was never generated (or its
//! stamp was lost), so the verdict is "not in sync" with a regeneration
//! recommendation rather than a guess.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::model::{format_lag, EntityKind, RecordRef};
use crate::service::ContentService;
use crate::store::StorageAdapter;

/// Two entities are in sync when their stamps are within this window.
pub const SYNC_TOLERANCE_SECS: i64 = 300;

/// The one remedy for a missing or never-written entity: generate it.
/// Shared wording so the health monitor's aggregation dedups cleanly.
pub(crate) fn regenerate_recommendation(kind: EntityKind) -> String {
    format!("Generate {} to record a fresh sync point", kind.label())
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub first: EntityKind,
    pub second: EntityKind,
    pub in_sync: bool,
    /// Absolute stamp difference in seconds; `None` when a stamp is missing.
    pub lag_seconds: Option<i64>,
    pub first_stamp: Option<DateTime<Utc>>,
    pub second_stamp: Option<DateTime<Utc>>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl SyncStatus {
    pub fn lag(&self) -> Option<Duration> {
        self.lag_seconds.map(Duration::seconds)
    }
}

/// Compare the last-modified stamps of two entities on one record.
pub fn verify<A: StorageAdapter, B: StorageAdapter>(
    service: &ContentService<A, B>,
    first: EntityKind,
    second: EntityKind,
    record: &RecordRef,
) -> Result<SyncStatus> {
    let first_stamp = service.entity_stamp(first, record)?;
    let second_stamp = service.entity_stamp(second, record)?;

    let mut status = SyncStatus {
        first,
        second,
        in_sync: false,
        lag_seconds: None,
        first_stamp,
        second_stamp,
        issues: Vec::new(),
        recommendations: Vec::new(),
    };

    let mut missing = false;
    for (kind, stamp) in [(first, first_stamp), (second, second_stamp)] {
        if stamp.is_none() {
            missing = true;
            status
                .issues
                .push(format!("no {} timestamp found", kind.name()));
            status.recommendations.push(regenerate_recommendation(kind));
        }
    }
    if missing {
        return Ok(status);
    }

    let (ts_first, ts_second) = (first_stamp.unwrap_or_default(), second_stamp.unwrap_or_default());
    let lag = ts_first.signed_duration_since(ts_second).abs();
    status.lag_seconds = Some(lag.num_seconds());
    status.in_sync = lag.num_seconds() <= SYNC_TOLERANCE_SECS;

    if !status.in_sync {
        let (newer, older) = if ts_first > ts_second {
            (first, second)
        } else {
            (second, first)
        };
        status.issues.push(format!(
            "{} is newer than {} by {}",
            newer.name(),
            older.name(),
            format_lag(lag)
        ));
        status.recommendations.push(format!(
            "Regenerate {} so it reflects the current {}",
            older.label(),
            newer.label()
        ));
    }

    Ok(status)
}
