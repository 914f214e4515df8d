//! End-to-end flow over file-backed stores: generate-style saves, drift,
//! verification, and the health projection, the way a transport layer
//! would drive the library.

use chrono::{Duration, Utc};
use mediakitapp::dispatch::{self, Operation, Request};
use mediakitapp::health::{self, HealthRating};
use mediakitapp::mapping;
use mediakitapp::model::{DataQuality, EntityKind, RecordRef};
use mediakitapp::orchestrator::{self, SavePhase};
use mediakitapp::service::ContentService;
use mediakitapp::store::{EntryBackend, MetaBackend};
use mediakitapp::sync;
use std::collections::HashMap;
use tempfile::TempDir;

fn open_service(dir: &TempDir) -> ContentService<EntryBackend, MetaBackend> {
    ContentService::new(
        EntryBackend::open(dir.path()).unwrap(),
        MetaBackend::open(dir.path()).unwrap(),
    )
}

fn topic_fields() -> Vec<(String, String)> {
    (1..=5)
        .map(|i| (format!("topic_{}", i), format!("Topic number {}", i)))
        .collect()
}

fn question_fields() -> Vec<(String, String)> {
    (1..=25)
        .map(|i| (format!("question_{}", i), format!("Question number {}?", i)))
        .collect()
}

#[test]
fn a_full_editorial_session_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let record = RecordRef::both(301, 7401);

    {
        let service = open_service(&dir);
        let save =
            orchestrator::save_with_fallback(&service, EntityKind::Topics, &record, &topic_fields())
                .unwrap();
        assert_eq!(save.terminal(), SavePhase::FullSuccess);

        orchestrator::save_with_fallback(
            &service,
            EntityKind::Questions,
            &record,
            &question_fields(),
        )
        .unwrap();
    }

    // Fresh process: everything reads back with full quality and in sync.
    let service = open_service(&dir);
    let topics = service.load(EntityKind::Topics, &record).unwrap();
    assert_eq!(topics.quality, DataQuality::Excellent);

    let status = sync::verify(&service, EntityKind::Topics, EntityKind::Questions, &record).unwrap();
    assert!(status.in_sync);

    let health = health::assess(&service, &record).unwrap();
    assert_eq!(health.score, 100);
    assert_eq!(health.overall, HealthRating::Excellent);
}

#[test]
fn drift_is_detected_after_a_one_sided_edit() {
    let dir = TempDir::new().unwrap();
    let record = RecordRef::both(301, 7401);
    let service = open_service(&dir);

    orchestrator::save_with_fallback(&service, EntityKind::Topics, &record, &topic_fields())
        .unwrap();
    orchestrator::save_with_fallback(&service, EntityKind::Questions, &record, &question_fields())
        .unwrap();

    // Questions fall behind: their stamp is pushed past the tolerance.
    service
        .meta_backend()
        .set_stamp(
            7401,
            mapping::entity_for(EntityKind::Questions),
            Utc::now() - Duration::seconds(1800),
        )
        .unwrap();
    service
        .entry_backend()
        .set_stamp(
            301,
            mapping::entity_for(EntityKind::Questions),
            Utc::now() - Duration::seconds(1800),
        )
        .unwrap();

    let status = sync::verify(&service, EntityKind::Topics, EntityKind::Questions, &record).unwrap();
    assert!(!status.in_sync);
    assert!(status.issues[0].contains("topics is newer than questions"));

    let health = health::assess(&service, &record).unwrap();
    assert_eq!(health.breakdown.sync, 10);
    assert!(health
        .recommendations
        .iter()
        .any(|r| r.contains("Regenerate interview questions")));
}

#[test]
fn the_request_boundary_drives_the_same_flow() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    let mut fields = HashMap::new();
    fields.insert("who".to_string(), "coaches".to_string());
    fields.insert("what".to_string(), "scale their practice".to_string());
    fields.insert("when".to_string(), "they plateau".to_string());
    fields.insert("how".to_string(), "via my framework".to_string());

    let save = dispatch::handle(
        &service,
        &Request {
            operation: Operation::Save,
            record_id_a: Some(301),
            record_id_b: Some(7401),
            entity: Some("authority_hook".to_string()),
            compare_to: None,
            fields: Some(fields),
            field: None,
            value: None,
        },
    );
    assert!(save.success);

    let load = dispatch::handle(
        &service,
        &Request {
            operation: Operation::Load,
            record_id_a: Some(301),
            record_id_b: Some(7401),
            entity: Some("authority_hook".to_string()),
            compare_to: None,
            fields: None,
            field: None,
            value: None,
        },
    );
    assert!(load.success);
    let data = load.data.unwrap();
    let complete = data["fields"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["key"] == "complete")
        .unwrap();
    assert_eq!(
        complete["value"],
        "I help coaches scale their practice when they plateau via my framework."
    );
}

#[test]
fn partial_outage_leaves_one_store_holding_the_data() {
    let dir = TempDir::new().unwrap();
    let record = RecordRef::both(301, 7401);
    let service = open_service(&dir);
    service.entry_backend().set_simulate_write_error(true);

    let save =
        orchestrator::save_with_fallback(&service, EntityKind::Topics, &record, &topic_fields())
            .unwrap();
    assert_eq!(save.terminal(), SavePhase::PartialSuccess);

    // The meta store carried the save; a fresh load merges it back in.
    service.entry_backend().set_simulate_write_error(false);
    let topics = service.load(EntityKind::Topics, &record).unwrap();
    assert_eq!(topics.quality, DataQuality::Excellent);
    assert_eq!(topics.get("topic_1"), Some("Topic number 1"));
}
