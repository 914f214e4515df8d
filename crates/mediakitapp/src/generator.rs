//! # Generation Interface
//!
//! The text-generation API client is an external collaborator: this module
//! defines the contract the core consumes and the handler that turns a
//! generation result into persisted fields. It never constructs a client.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{MediakitError, Result};
use crate::mapping;
use crate::model::{EntityKind, RecordRef};
use crate::orchestrator::{self, OrchestratedSave};
use crate::service::ContentService;
use crate::store::StorageAdapter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// What the collaborator returns: generated text or an error, nothing else.
#[derive(Debug, Clone)]
pub enum GenerationOutcome {
    Success { content: String },
    Failure { error: String },
}

/// The text-generation collaborator contract.
pub trait TextGenerator {
    fn generate(&self, prompt: &str, options: &GenerationOptions) -> GenerationOutcome;
}

/// Parse generated text into field values for an entity.
///
/// Sequential entities (topics, questions, offers) take one non-empty line
/// per slot, in order. Component entities (authority hook, biography) take
/// `key: value` lines matching their field keys.
pub fn parse_generated(kind: EntityKind, content: &str) -> Vec<(String, String)> {
    let def = mapping::entity_for(kind);
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if def.sequential {
        def.data_fields()
            .zip(lines)
            .map(|(binding, line)| (binding.key.to_string(), line.to_string()))
            .collect()
    } else {
        lines
            .iter()
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                let key = key.trim();
                let value = value.trim();
                def.data_fields()
                    .find(|b| b.key == key)
                    .map(|b| (b.key.to_string(), value.to_string()))
            })
            .collect()
    }
}

/// The generation handler: invoke the collaborator, parse the result into
/// the entity's fields, and persist through the save orchestrator.
pub fn generate_entity<G, A, B>(
    generator: &G,
    service: &ContentService<A, B>,
    kind: EntityKind,
    record: &RecordRef,
    prompt: &str,
    options: &GenerationOptions,
) -> Result<OrchestratedSave>
where
    G: TextGenerator,
    A: StorageAdapter,
    B: StorageAdapter,
{
    let content = match generator.generate(prompt, options) {
        GenerationOutcome::Success { content } => content,
        GenerationOutcome::Failure { error } => return Err(MediakitError::Generation(error)),
    };

    let fields = parse_generated(kind, &content);
    orchestrator::save_with_fallback(service, kind, record, &fields)
}

/// A scripted generator for tests: returns queued outcomes in order.
pub struct ScriptedGenerator {
    responses: RefCell<VecDeque<GenerationOutcome>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<GenerationOutcome>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
        }
    }

    pub fn success(content: &str) -> Self {
        Self::new(vec![GenerationOutcome::Success {
            content: content.to_string(),
        }])
    }

    pub fn failure(error: &str) -> Self {
        Self::new(vec![GenerationOutcome::Failure {
            error: error.to_string(),
        }])
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> GenerationOutcome {
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(GenerationOutcome::Failure {
                error: "no scripted response left".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataQuality;
    use crate::orchestrator::SavePhase;
    use crate::store::{EntryBackend, MetaBackend};

    fn service() -> ContentService<EntryBackend, MetaBackend> {
        ContentService::new(EntryBackend::in_memory(), MetaBackend::in_memory())
    }

    #[test]
    fn sequential_content_maps_line_per_slot() {
        let fields = parse_generated(
            EntityKind::Topics,
            "How to price premium offers\n\nWhy referrals dry up\nDelegation that sticks\n",
        );
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].0, "topic_1");
        assert_eq!(fields[0].1, "How to price premium offers");
        assert_eq!(fields[2].1, "Delegation that sticks");
    }

    #[test]
    fn component_content_maps_by_key() {
        let fields = parse_generated(
            EntityKind::AuthorityHook,
            "who: boutique agencies\nwhat: double retainers\nnot_a_key: dropped\n",
        );
        assert_eq!(
            fields,
            vec![
                ("who".to_string(), "boutique agencies".to_string()),
                ("what".to_string(), "double retainers".to_string()),
            ]
        );
    }

    #[test]
    fn excess_lines_beyond_the_slots_are_ignored() {
        let content = (1..=8)
            .map(|i| format!("Line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let fields = parse_generated(EntityKind::Topics, &content);
        assert_eq!(fields.len(), 5);
    }

    #[test]
    fn generation_result_is_persisted_through_the_orchestrator() {
        let svc = service();
        let generator = ScriptedGenerator::success(
            "Pricing with confidence\nReferrals on autopilot\nHiring your first closer\nOffers that sell themselves\nScaling past founder-led sales",
        );

        let save = generate_entity(
            &generator,
            &svc,
            EntityKind::Topics,
            &RecordRef::both(301, 7401),
            "five topics for a sales coach",
            &GenerationOptions::default(),
        )
        .unwrap();

        assert_eq!(save.terminal(), SavePhase::FullSuccess);
        let entity = svc
            .load(EntityKind::Topics, &RecordRef::both(301, 7401))
            .unwrap();
        assert_eq!(entity.quality, DataQuality::Excellent);
    }

    #[test]
    fn generation_failure_surfaces_as_an_error() {
        let svc = service();
        let generator = ScriptedGenerator::failure("rate limited");

        let err = generate_entity(
            &generator,
            &svc,
            EntityKind::Topics,
            &RecordRef::both(301, 7401),
            "five topics",
            &GenerationOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(err, MediakitError::Generation(_)));
    }
}
