//! # Request Boundary
//!
//! Transport-abstracted dispatch: a serde-shaped [`Request`] in, a
//! [`Response`] out. This is a thin facade: it normalizes inputs (record
//! ids, entity names, field maps), routes to the right operation, and
//! converts every failure into a structured response. No business logic,
//! no I/O of its own, and no panics across this boundary.
//!
//! ## Legacy action names
//!
//! Older clients addressed one handler per entity per verb
//! (`save_topics_data`, `get_authority_hook`, ...). Those names collapse
//! into the single [`Operation`] enum here, at the boundary; the core never
//! sees them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::health;
use crate::mapping;
use crate::model::RecordRef;
use crate::orchestrator;
use crate::service::ContentService;
use crate::store::StorageAdapter;
use crate::sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Save,
    SaveSingle,
    Verify,
    Health,
}

/// The inbound request shape, independent of transport.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub operation: Operation,
    /// Backend A record id (form entry).
    #[serde(default)]
    pub record_id_a: Option<u64>,
    /// Backend B record id (post).
    #[serde(default)]
    pub record_id_b: Option<u64>,
    #[serde(default, alias = "entity_name")]
    pub entity: Option<String>,
    /// Second entity for `verify`.
    #[serde(default)]
    pub compare_to: Option<String>,
    #[serde(default)]
    pub fields: Option<HashMap<String, String>>,
    /// Field key for `save_single`.
    #[serde(default)]
    pub field: Option<String>,
    /// Field value for `save_single`.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: Value, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Translate a legacy action name into the operation enum and, where the
/// name implies one, the entity it addressed.
pub fn translate_action(action: &str) -> Option<(Operation, Option<&'static str>)> {
    let mapped = match action {
        "get_topics_data" => (Operation::Load, Some("topics")),
        "save_topics_data" => (Operation::Save, Some("topics")),
        "save_topic_field" => (Operation::SaveSingle, Some("topics")),
        "get_authority_hook" => (Operation::Load, Some("authority_hook")),
        "save_authority_hook" | "save_authority_hook_components" => {
            (Operation::Save, Some("authority_hook"))
        }
        "save_questions_data" => (Operation::Save, Some("questions")),
        "save_biography_data" => (Operation::Save, Some("biography")),
        "save_offers_data" => (Operation::Save, Some("offers")),
        "check_topics_questions_sync" => (Operation::Verify, Some("topics")),
        "data_health_check" | "content_health_check" => (Operation::Health, None),
        _ => return None,
    };
    Some(mapped)
}

/// Route a request. Every failure comes back as a structured response with
/// a human-readable message; errors never cross this boundary raw.
pub fn handle<A: StorageAdapter, B: StorageAdapter>(
    service: &ContentService<A, B>,
    request: &Request,
) -> Response {
    match route(service, request) {
        Ok(response) => response,
        Err(e) => Response::fail(e.to_string()),
    }
}

fn route<A: StorageAdapter, B: StorageAdapter>(
    service: &ContentService<A, B>,
    request: &Request,
) -> Result<Response> {
    let record = RecordRef::new(request.record_id_a, request.record_id_b)?;

    match request.operation {
        Operation::Load => {
            let name = required(&request.entity, "load requires 'entity'")?;
            let entity = service.load_named(name, &record)?;
            Ok(Response::ok(serde_json::to_value(&entity)?))
        }
        Operation::Save => {
            let name = required(&request.entity, "save requires 'entity'")?;
            let def = mapping::entity(name)?;
            let fields = match &request.fields {
                Some(f) if !f.is_empty() => ordered_fields(def, f),
                _ => return Ok(Response::fail("save requires a non-empty 'fields' map")),
            };
            let save = orchestrator::save_with_fallback(service, def.kind, &record, &fields)?;
            let summary = save.summary.clone();
            let success = save.succeeded();
            let data = serde_json::to_value(&save)?;
            if success {
                Ok(Response::ok_with_message(data, summary))
            } else {
                Ok(Response {
                    success: false,
                    data: Some(data),
                    message: Some(summary),
                })
            }
        }
        Operation::SaveSingle => {
            let name = required(&request.entity, "save_single requires 'entity'")?;
            let def = mapping::entity(name)?;
            let field = required(&request.field, "save_single requires 'field'")?;
            let value = request.value.clone().unwrap_or_default();
            let fields = vec![(field.to_string(), value)];
            let save = orchestrator::save_with_fallback(service, def.kind, &record, &fields)?;
            Ok(Response {
                success: save.succeeded(),
                message: Some(save.summary.clone()),
                data: Some(serde_json::to_value(&save)?),
            })
        }
        Operation::Verify => {
            let first = required(&request.entity, "verify requires 'entity'")?;
            let second = required(&request.compare_to, "verify requires 'compare_to'")?;
            let first = mapping::entity(first)?.kind;
            let second = mapping::entity(second)?.kind;
            let status = sync::verify(service, first, second, &record)?;
            Ok(Response::ok(serde_json::to_value(&status)?))
        }
        Operation::Health => {
            let status = health::assess(service, &record)?;
            Ok(Response::ok(serde_json::to_value(&status)?))
        }
    }
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| crate::error::MediakitError::Validation(vec![message.to_string()]))
}

/// Order an incoming field map by the entity's mapping order, unknown keys
/// last (alphabetically, for deterministic warnings).
fn ordered_fields(def: &mapping::EntityDef, fields: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut ordered: Vec<(String, String)> = def
        .fields
        .iter()
        .filter_map(|binding| {
            fields
                .get(binding.key)
                .map(|v| (binding.key.to_string(), v.clone()))
        })
        .collect();

    let mut unknown: Vec<&String> = fields
        .keys()
        .filter(|k| def.binding(k.as_str()).is_none())
        .collect();
    unknown.sort();
    for key in unknown {
        ordered.push((key.clone(), fields[key].clone()));
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{EntryBackend, MetaBackend};

    fn service() -> ContentService<EntryBackend, MetaBackend> {
        ContentService::new(EntryBackend::in_memory(), MetaBackend::in_memory())
    }

    fn request_json(raw: &str) -> Request {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn request_parses_from_transport_json() {
        let request = request_json(
            r#"{
                "operation": "save",
                "record_id_a": 301,
                "record_id_b": 7401,
                "entity": "topics",
                "fields": {"topic_1": "Pricing"}
            }"#,
        );
        assert_eq!(request.operation, Operation::Save);
        assert_eq!(request.record_id_a, Some(301));
    }

    #[test]
    fn missing_record_ids_fail_with_a_message() {
        let svc = service();
        let response = handle(
            &svc,
            &request_json(r#"{"operation": "load", "entity": "topics"}"#),
        );
        assert!(!response.success);
        assert!(response.message.unwrap().contains("record id"));
    }

    #[test]
    fn unknown_entity_is_surfaced_not_panicked() {
        let svc = service();
        let response = handle(
            &svc,
            &request_json(
                r#"{"operation": "load", "record_id_b": 7401, "entity": "press_release"}"#,
            ),
        );
        assert!(!response.success);
        assert!(response.message.unwrap().contains("Unknown entity"));
    }

    #[test]
    fn save_then_load_round_trips_through_the_boundary() {
        let svc = service();

        let save = handle(
            &svc,
            &request_json(
                r#"{
                    "operation": "save",
                    "record_id_a": 301,
                    "record_id_b": 7401,
                    "entity": "topics",
                    "fields": {"topic_1": "Pricing with confidence"}
                }"#,
            ),
        );
        assert!(save.success);
        assert!(save.message.unwrap().contains("Saved"));

        let load = handle(
            &svc,
            &request_json(
                r#"{
                    "operation": "load",
                    "record_id_a": 301,
                    "record_id_b": 7401,
                    "entity": "topics"
                }"#,
            ),
        );
        assert!(load.success);
        let data = load.data.unwrap();
        assert_eq!(data["quality"], "poor");
        assert_eq!(data["fields"][0]["value"], "Pricing with confidence");
    }

    #[test]
    fn save_single_uses_the_same_discipline() {
        let svc = service();
        let response = handle(
            &svc,
            &request_json(
                r#"{
                    "operation": "save_single",
                    "record_id_a": 301,
                    "record_id_b": 7401,
                    "entity": "topics",
                    "field": "topic_2",
                    "value": "Referrals on autopilot"
                }"#,
            ),
        );
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data["result"]["entry"]["saved"][0], "topic_2");
        assert_eq!(data["result"]["meta"]["saved"][0], "topic_2");
    }

    #[test]
    fn verify_and_health_answer_on_fresh_records() {
        let svc = service();

        let verify = handle(
            &svc,
            &request_json(
                r#"{
                    "operation": "verify",
                    "record_id_b": 7401,
                    "entity": "topics",
                    "compare_to": "questions"
                }"#,
            ),
        );
        assert!(verify.success);
        let data = verify.data.unwrap();
        assert_eq!(data["in_sync"], false);
        assert_eq!(data["issues"].as_array().unwrap().len(), 2);

        let health = handle(
            &svc,
            &request_json(r#"{"operation": "health", "record_id_b": 7401}"#),
        );
        assert!(health.success);
        assert_eq!(health.data.unwrap()["overall"], "critical");
    }

    #[test]
    fn validation_failures_come_back_structured() {
        let svc = service();
        let response = handle(
            &svc,
            &request_json(
                r#"{
                    "operation": "save",
                    "record_id_a": 301,
                    "entity": "topics",
                    "fields": {"nothing_mapped": "value"}
                }"#,
            ),
        );
        assert!(!response.success);
        assert!(response.message.unwrap().contains("Validation failed"));
    }

    #[test]
    fn legacy_actions_translate_into_the_operation_enum() {
        assert_eq!(
            translate_action("save_topics_data"),
            Some((Operation::Save, Some("topics")))
        );
        assert_eq!(
            translate_action("save_authority_hook_components"),
            Some((Operation::Save, Some("authority_hook")))
        );
        assert_eq!(
            translate_action("check_topics_questions_sync"),
            Some((Operation::Verify, Some("topics")))
        );
        assert_eq!(
            translate_action("data_health_check"),
            Some((Operation::Health, None))
        );
        assert_eq!(translate_action("totally_unknown"), None);
    }

    #[test]
    fn field_maps_are_ordered_by_the_mapping_table() {
        let def = mapping::entity("topics").unwrap();
        let mut map = HashMap::new();
        map.insert("topic_3".to_string(), "c".to_string());
        map.insert("topic_1".to_string(), "a".to_string());
        map.insert("zz_unknown".to_string(), "x".to_string());
        map.insert("aa_unknown".to_string(), "y".to_string());

        let ordered = ordered_fields(def, &map);
        let keys: Vec<&str> = ordered.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["topic_1", "topic_3", "aa_unknown", "zz_unknown"]);
    }
}
