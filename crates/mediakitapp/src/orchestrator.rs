//! # Save Orchestrator
//!
//! Wraps the service's dual-backend save with pre-validation, partial
//! failure tracking, and a single-backend fallback retry:
//!
//! ```text
//! Pending -> Validating -> Writing -> FullSuccess
//!                                  -> PartialSuccess
//!                                  -> FallbackAttempted -> FallbackSuccess
//!                                                       -> Failed
//! ```
//!
//! The fallback only fires when the combined write fails wholesale; one
//! saved field on either backend is already a partial success and stands.
//! Every traversed phase is recorded on the result, and the summary line
//! states which store(s) ended up holding the data.

use serde::Serialize;

use crate::error::{MediakitError, Result};
use crate::mapping;
use crate::model::{EntityKind, RecordRef};
use crate::service::{BackendOutcome, ContentService, SaveOutcome, SaveResult};
use crate::store::StorageAdapter;

/// Values shorter than this (after trimming) fail validation.
/// Empty strings are legal: they clear a field.
const MIN_FIELD_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    Pending,
    Validating,
    Writing,
    FullSuccess,
    PartialSuccess,
    FallbackAttempted,
    FallbackSuccess,
    Failed,
}

/// A completed orchestrated save: the phase trail, the dual-write result,
/// the fallback outcome if one ran, and a human-readable summary.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratedSave {
    pub phases: Vec<SavePhase>,
    pub result: SaveResult,
    pub fallback: Option<BackendOutcome>,
    pub summary: String,
}

impl OrchestratedSave {
    pub fn terminal(&self) -> SavePhase {
        self.phases.last().copied().unwrap_or(SavePhase::Failed)
    }

    pub fn succeeded(&self) -> bool {
        matches!(
            self.terminal(),
            SavePhase::FullSuccess | SavePhase::PartialSuccess | SavePhase::FallbackSuccess
        )
    }
}

/// Validate, dual-write, and fall back to the post meta store if the
/// combined write fully failed.
pub fn save_with_fallback<A: StorageAdapter, B: StorageAdapter>(
    service: &ContentService<A, B>,
    kind: EntityKind,
    record: &RecordRef,
    fields: &[(String, String)],
) -> Result<OrchestratedSave> {
    let mut phases = vec![SavePhase::Pending, SavePhase::Validating];
    validate(kind, fields)?;

    phases.push(SavePhase::Writing);
    let result = service.save(kind, record, fields)?;

    let (fallback, summary) = match result.outcome() {
        SaveOutcome::FullSuccess => {
            phases.push(SavePhase::FullSuccess);
            (None, full_success_summary(&result))
        }
        SaveOutcome::PartialSuccess => {
            phases.push(SavePhase::PartialSuccess);
            let summary = format!(
                "Partially saved {}: form entry store {} saved / {} failed, post meta store {} saved / {} failed",
                result.entity.label(),
                result.entry.saved.len(),
                result.entry.failed.len(),
                result.meta.saved.len(),
                result.meta.failed.len(),
            );
            (None, summary)
        }
        SaveOutcome::Failed => {
            phases.push(SavePhase::FallbackAttempted);
            let outcome = service.fallback_write(kind, record, fields)?;
            if outcome.any_saved() {
                phases.push(SavePhase::FallbackSuccess);
                let summary = format!(
                    "Primary save failed; fallback wrote {} of {} field(s) to the post meta store",
                    outcome.saved.len(),
                    outcome.saved.len() + outcome.failed.len(),
                );
                (Some(outcome), summary)
            } else {
                phases.push(SavePhase::Failed);
                (
                    Some(outcome),
                    format!(
                        "All writes failed for {} on both stores",
                        result.entity.label()
                    ),
                )
            }
        }
    };

    Ok(OrchestratedSave {
        phases,
        result,
        fallback,
        summary,
    })
}

fn full_success_summary(result: &SaveResult) -> String {
    let entity = result.entity.label();
    match (result.entry.any_saved(), result.meta.any_saved()) {
        (true, true) => format!(
            "Saved {} field(s) of {} to both stores",
            result.entry.saved.len().max(result.meta.saved.len()),
            entity
        ),
        (true, false) => format!(
            "Saved {} field(s) of {} to the form entry store",
            result.entry.saved.len(),
            entity
        ),
        (false, true) => format!(
            "Saved {} field(s) of {} to the post meta store",
            result.meta.saved.len(),
            entity
        ),
        // outcome() can't be FullSuccess with nothing saved.
        (false, false) => format!("Nothing to save for {}", entity),
    }
}

/// Pre-save validation: at least one resolvable field, and no non-empty
/// value shorter than the floor. All violations are collected and surfaced
/// together; nothing is auto-corrected.
fn validate(kind: EntityKind, fields: &[(String, String)]) -> Result<()> {
    let def = mapping::entity_for(kind);
    let mut violations = Vec::new();

    let resolvable: Vec<&(String, String)> = fields
        .iter()
        .filter(|(key, _)| {
            def.binding(key)
                .map(|b| !def.is_composite(b.key))
                .unwrap_or(false)
        })
        .collect();

    if resolvable.is_empty() {
        violations.push(format!(
            "no recognized fields for {} in the request",
            def.name()
        ));
    }

    for (key, value) in &resolvable {
        let trimmed = value.trim();
        if !trimmed.is_empty() && trimmed.chars().count() < MIN_FIELD_LEN {
            violations.push(format!("'{}' is too short", key));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(MediakitError::Validation(violations))
    }
}
