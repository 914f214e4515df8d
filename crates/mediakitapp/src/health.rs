//! # Health Monitor
//!
//! Aggregates record association, content quality, and sync state into one
//! 0–100 score with a categorical rating and remediation suggestions.
//!
//! Four sub-scores, 0–25 each:
//!
//! | Category            | 25                     | partial            | 0 |
//! |---------------------|------------------------|--------------------|---|
//! | association         | both backend ids       | one id (10)        | — |
//! | primary (topics)    | excellent              | good 20 / fair 15 / poor 8 | missing |
//! | secondary (questions)| excellent             | good 20 / fair 15 / poor 8 | missing |
//! | sync                | in sync                | measurable drift (10) | stamp missing |
//!
//! Rating buckets over the sum: ≥90 excellent, ≥75 good, ≥50 fair,
//! ≥25 poor, else critical.
//!
//! A health status is a fresh read-time projection: computed on demand,
//! never persisted.

use serde::Serialize;

use crate::error::Result;
use crate::model::{DataQuality, EntityKind, RecordRef};
use crate::service::ContentService;
use crate::store::StorageAdapter;
use crate::sync::{self, regenerate_recommendation, SyncStatus};

/// The entity pair health is judged on: topics drive question generation.
const PRIMARY: EntityKind = EntityKind::Topics;
const SECONDARY: EntityKind = EntityKind::Questions;

const FULL_CATEGORY: u8 = 25;
const HALF_ASSOCIATION: u8 = 10;
const DRIFTED_SYNC: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthRating::Excellent => "excellent",
            HealthRating::Good => "good",
            HealthRating::Fair => "fair",
            HealthRating::Poor => "poor",
            HealthRating::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthBreakdown {
    pub association: u8,
    pub primary_quality: u8,
    pub secondary_quality: u8,
    pub sync: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub overall: HealthRating,
    pub score: u8,
    pub breakdown: HealthBreakdown,
    pub recommendations: Vec<String>,
}

/// Bucket a 0–100 score into the five-level rating.
pub fn rating_for(score: u8) -> HealthRating {
    if score >= 90 {
        HealthRating::Excellent
    } else if score >= 75 {
        HealthRating::Good
    } else if score >= 50 {
        HealthRating::Fair
    } else if score >= 25 {
        HealthRating::Poor
    } else {
        HealthRating::Critical
    }
}

fn quality_points(quality: DataQuality) -> u8 {
    match quality {
        DataQuality::Excellent => 25,
        DataQuality::Good => 20,
        DataQuality::Fair => 15,
        DataQuality::Poor => 8,
        DataQuality::Missing => 0,
    }
}

fn quality_recommendation(kind: EntityKind, quality: DataQuality) -> Option<String> {
    match quality {
        DataQuality::Missing => Some(regenerate_recommendation(kind)),
        DataQuality::Poor => Some(format!(
            "Fill in the missing {}; most slots are empty or out of order",
            kind.label()
        )),
        DataQuality::Fair => Some(format!(
            "Review {}; several fields are still empty",
            kind.label()
        )),
        DataQuality::Good | DataQuality::Excellent => None,
    }
}

fn sync_points(status: &SyncStatus) -> u8 {
    if status.in_sync {
        FULL_CATEGORY
    } else if status.lag_seconds.is_some() {
        DRIFTED_SYNC
    } else {
        0
    }
}

/// Assess the record's overall data health. Computed on demand, never
/// persisted.
pub fn assess<A: StorageAdapter, B: StorageAdapter>(
    service: &ContentService<A, B>,
    record: &RecordRef,
) -> Result<HealthStatus> {
    let mut recommendations: Vec<String> = Vec::new();

    // 1. Record association: can both stores be kept in sync at all?
    let association = match (record.entry_id, record.post_id) {
        (Some(_), Some(_)) => FULL_CATEGORY,
        (Some(_), None) => {
            recommendations.push(
                "Associate the form entry with a post so generated content can be published"
                    .to_string(),
            );
            HALF_ASSOCIATION
        }
        (None, Some(_)) => {
            recommendations.push(
                "Link the post back to its source form entry so live edits flow through"
                    .to_string(),
            );
            HALF_ASSOCIATION
        }
        // RecordRef construction fails fast on (None, None).
        (None, None) => 0,
    };

    // 2./3. Content quality of the driving pair.
    let primary = service.load(PRIMARY, record)?;
    let primary_quality = quality_points(primary.quality);
    if let Some(rec) = quality_recommendation(PRIMARY, primary.quality) {
        recommendations.push(rec);
    }

    let secondary = service.load(SECONDARY, record)?;
    let secondary_quality = quality_points(secondary.quality);
    if let Some(rec) = quality_recommendation(SECONDARY, secondary.quality) {
        recommendations.push(rec);
    }

    // 4. Sync between the pair.
    let sync_status = sync::verify(service, PRIMARY, SECONDARY, record)?;
    let sync = sync_points(&sync_status);
    recommendations.extend(sync_status.recommendations.iter().cloned());

    // Dedup while preserving the association -> primary -> secondary -> sync
    // order.
    let mut seen = std::collections::HashSet::new();
    let recommendations: Vec<String> = recommendations
        .into_iter()
        .filter(|r| seen.insert(r.clone()))
        .collect();

    let score = association + primary_quality + secondary_quality + sync;
    Ok(HealthStatus {
        overall: rating_for(score),
        score,
        breakdown: HealthBreakdown {
            association,
            primary_quality,
            secondary_quality,
            sync,
        },
        recommendations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;
    use crate::store::{EntryBackend, MetaBackend};
    use chrono::{Duration, Utc};

    fn service() -> ContentService<EntryBackend, MetaBackend> {
        ContentService::new(EntryBackend::in_memory(), MetaBackend::in_memory())
    }

    fn record() -> RecordRef {
        RecordRef::both(301, 7401)
    }

    fn fill_topics(svc: &ContentService<EntryBackend, MetaBackend>, rec: &RecordRef) {
        let fields: Vec<(String, String)> = (1..=5)
            .map(|i| (format!("topic_{}", i), format!("Topic number {}", i)))
            .collect();
        svc.save(EntityKind::Topics, rec, &fields).unwrap();
    }

    fn fill_questions(svc: &ContentService<EntryBackend, MetaBackend>, rec: &RecordRef) {
        let fields: Vec<(String, String)> = (1..=25)
            .map(|i| (format!("question_{}", i), format!("Question number {}?", i)))
            .collect();
        svc.save(EntityKind::Questions, rec, &fields).unwrap();
    }

    #[test]
    fn fully_populated_record_scores_100() {
        let svc = service();
        let rec = record();
        fill_topics(&svc, &rec);
        fill_questions(&svc, &rec);

        let health = assess(&svc, &rec).unwrap();
        assert_eq!(health.score, 100);
        assert_eq!(health.overall, HealthRating::Excellent);
        assert!(health.recommendations.is_empty());
    }

    #[test]
    fn empty_record_is_poor_with_regeneration_advice() {
        let svc = service();
        let health = assess(&svc, &record()).unwrap();

        // Association 25, everything else 0.
        assert_eq!(health.score, 25);
        assert_eq!(health.overall, HealthRating::Poor);
        assert_eq!(health.breakdown.association, 25);
        assert_eq!(health.breakdown.primary_quality, 0);
        assert_eq!(health.breakdown.secondary_quality, 0);
        assert_eq!(health.breakdown.sync, 0);

        // Quality and sync both ask for generation with the same wording;
        // the aggregate carries each once.
        assert_eq!(health.recommendations.len(), 2);
        assert!(health.recommendations[0].contains("topics"));
        assert!(health.recommendations[1].contains("interview questions"));
    }

    #[test]
    fn single_id_record_loses_association_points() {
        let svc = service();
        let rec = RecordRef::entry(301);
        let health = assess(&svc, &rec).unwrap();

        assert_eq!(health.breakdown.association, 10);
        assert!(health.recommendations[0].contains("Associate the form entry"));
    }

    #[test]
    fn drifted_stamps_cost_sync_points() {
        let svc = service();
        let rec = record();
        fill_topics(&svc, &rec);
        fill_questions(&svc, &rec);

        // Push questions an hour behind.
        svc.meta_backend()
            .set_stamp(
                7401,
                mapping::entity_for(EntityKind::Questions),
                Utc::now() - Duration::seconds(3600),
            )
            .unwrap();

        let health = assess(&svc, &rec).unwrap();
        assert_eq!(health.breakdown.sync, 10);
        assert_eq!(health.score, 85);
        assert_eq!(health.overall, HealthRating::Good);
        assert!(health
            .recommendations
            .iter()
            .any(|r| r.contains("Regenerate interview questions")));
    }

    #[test]
    fn score_is_always_within_bounds_and_buckets_match() {
        // Sweep a set of representative states and check the documented
        // invariants rather than specific totals.
        let states: Vec<ContentService<EntryBackend, MetaBackend>> = vec![
            service(), // empty
            {
                let svc = service();
                fill_topics(&svc, &record());
                svc
            },
            {
                let svc = service();
                fill_topics(&svc, &record());
                fill_questions(&svc, &record());
                svc
            },
        ];

        for svc in &states {
            for rec in [record(), RecordRef::entry(301), RecordRef::post(7401)] {
                let health = assess(svc, &rec).unwrap();
                assert!(health.score <= 100);
                assert_eq!(health.overall, rating_for(health.score));
            }
        }
    }

    #[test]
    fn rating_thresholds_are_exact() {
        assert_eq!(rating_for(100), HealthRating::Excellent);
        assert_eq!(rating_for(90), HealthRating::Excellent);
        assert_eq!(rating_for(89), HealthRating::Good);
        assert_eq!(rating_for(75), HealthRating::Good);
        assert_eq!(rating_for(74), HealthRating::Fair);
        assert_eq!(rating_for(50), HealthRating::Fair);
        assert_eq!(rating_for(49), HealthRating::Poor);
        assert_eq!(rating_for(25), HealthRating::Poor);
        assert_eq!(rating_for(24), HealthRating::Critical);
        assert_eq!(rating_for(0), HealthRating::Critical);
    }
}
