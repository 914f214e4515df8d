//! # Field Mapping Table
//!
//! Static configuration mapping each logical field key to its storage
//! identifiers: a form-entry field id (backend A, a numeric attribute id
//! kept as a string) and/or a post-meta key (backend B).
//!
//! This is pure lookup: no I/O, no mutation. Every field must resolve to
//! at least one backend id; a key with no mapping at all is a configuration
//! error caught by the table's own tests, not a runtime condition.
//!
//! A field mapped on only one side is legal: `bio_long` lives in the meta
//! store alone because the form never collects it.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{MediakitError, Result};
use crate::model::EntityKind;

/// One logical field's storage bindings.
#[derive(Debug, Clone, Copy)]
pub struct FieldBinding {
    pub key: &'static str,
    /// Backend A: form-entry field id.
    pub entry_field: Option<&'static str>,
    /// Backend B: post-meta key.
    pub meta_key: Option<&'static str>,
    /// Default placeholder the UI seeds the field with. A value equal to
    /// its placeholder does not count as filled.
    pub placeholder: Option<&'static str>,
}

const fn field(
    key: &'static str,
    entry_field: &'static str,
    meta_key: &'static str,
) -> FieldBinding {
    FieldBinding {
        key,
        entry_field: Some(entry_field),
        meta_key: Some(meta_key),
        placeholder: None,
    }
}

/// An entity: a named group of logical fields persisted together.
#[derive(Debug, Clone, Copy)]
pub struct EntityDef {
    pub kind: EntityKind,
    /// Ordered entities get gap detection in quality scoring.
    pub sequential: bool,
    /// Key of the derived composite field, if the entity has one.
    pub composite: Option<&'static str>,
    pub fields: &'static [FieldBinding],
}

impl EntityDef {
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn binding(&self, key: &str) -> Option<&'static FieldBinding> {
        self.fields.iter().find(|b| b.key == key)
    }

    pub fn is_composite(&self, key: &str) -> bool {
        self.composite.map(|c| c == key).unwrap_or(false)
    }

    /// The fields that carry information: everything except the composite.
    pub fn data_fields(&self) -> impl Iterator<Item = &'static FieldBinding> {
        let composite = self.composite;
        self.fields.iter().filter(move |b| Some(b.key) != composite)
    }

    /// Meta key of the per-record "last modified" side channel.
    pub fn stamp_key(&self) -> String {
        format!("{}_updated", self.name())
    }
}

pub const HOOK_PLACEHOLDERS: [&str; 4] = [
    "your audience",
    "achieve their goals",
    "they need you",
    "through your method",
];

static AUTHORITY_HOOK_FIELDS: [FieldBinding; 5] = [
    FieldBinding {
        key: "who",
        entry_field: Some("8101"),
        meta_key: Some("hook_who"),
        placeholder: Some("your audience"),
    },
    FieldBinding {
        key: "what",
        entry_field: Some("8102"),
        meta_key: Some("hook_what"),
        placeholder: Some("achieve their goals"),
    },
    FieldBinding {
        key: "when",
        entry_field: Some("8103"),
        meta_key: Some("hook_when"),
        placeholder: Some("they need you"),
    },
    FieldBinding {
        key: "how",
        entry_field: Some("8104"),
        meta_key: Some("hook_how"),
        placeholder: Some("through your method"),
    },
    FieldBinding {
        key: "complete",
        entry_field: Some("8105"),
        meta_key: Some("hook_complete"),
        placeholder: None,
    },
];

static TOPIC_FIELDS: [FieldBinding; 5] = [
    field("topic_1", "8201", "topic_1"),
    field("topic_2", "8202", "topic_2"),
    field("topic_3", "8203", "topic_3"),
    field("topic_4", "8204", "topic_4"),
    field("topic_5", "8205", "topic_5"),
];

// Five questions per topic, twenty-five total.
static QUESTION_FIELDS: [FieldBinding; 25] = [
    field("question_1", "8301", "question_1"),
    field("question_2", "8302", "question_2"),
    field("question_3", "8303", "question_3"),
    field("question_4", "8304", "question_4"),
    field("question_5", "8305", "question_5"),
    field("question_6", "8306", "question_6"),
    field("question_7", "8307", "question_7"),
    field("question_8", "8308", "question_8"),
    field("question_9", "8309", "question_9"),
    field("question_10", "8310", "question_10"),
    field("question_11", "8311", "question_11"),
    field("question_12", "8312", "question_12"),
    field("question_13", "8313", "question_13"),
    field("question_14", "8314", "question_14"),
    field("question_15", "8315", "question_15"),
    field("question_16", "8316", "question_16"),
    field("question_17", "8317", "question_17"),
    field("question_18", "8318", "question_18"),
    field("question_19", "8319", "question_19"),
    field("question_20", "8320", "question_20"),
    field("question_21", "8321", "question_21"),
    field("question_22", "8322", "question_22"),
    field("question_23", "8323", "question_23"),
    field("question_24", "8324", "question_24"),
    field("question_25", "8325", "question_25"),
];

static BIOGRAPHY_FIELDS: [FieldBinding; 3] = [
    field("bio_short", "8401", "bio_short"),
    field("bio_medium", "8402", "bio_medium"),
    // The form never collects the long bio; it exists in the meta store only.
    FieldBinding {
        key: "bio_long",
        entry_field: None,
        meta_key: Some("bio_long"),
        placeholder: None,
    },
];

static OFFER_FIELDS: [FieldBinding; 5] = [
    field("offer_1", "8501", "offer_1"),
    field("offer_2", "8502", "offer_2"),
    field("offer_3", "8503", "offer_3"),
    field("offer_4", "8504", "offer_4"),
    field("offer_5", "8505", "offer_5"),
];

static ENTITIES: [EntityDef; 5] = [
    EntityDef {
        kind: EntityKind::AuthorityHook,
        sequential: false,
        composite: Some("complete"),
        fields: &AUTHORITY_HOOK_FIELDS,
    },
    EntityDef {
        kind: EntityKind::Topics,
        sequential: true,
        composite: None,
        fields: &TOPIC_FIELDS,
    },
    EntityDef {
        kind: EntityKind::Questions,
        sequential: true,
        composite: None,
        fields: &QUESTION_FIELDS,
    },
    EntityDef {
        kind: EntityKind::Biography,
        sequential: false,
        composite: None,
        fields: &BIOGRAPHY_FIELDS,
    },
    EntityDef {
        kind: EntityKind::Offers,
        sequential: true,
        composite: None,
        fields: &OFFER_FIELDS,
    },
];

static BY_NAME: Lazy<HashMap<&'static str, &'static EntityDef>> = Lazy::new(|| {
    ENTITIES
        .iter()
        .map(|def| (def.name(), def))
        .collect()
});

/// Look an entity up by name. Unknown names are a configuration error.
pub fn entity(name: &str) -> Result<&'static EntityDef> {
    BY_NAME
        .get(name)
        .copied()
        .ok_or_else(|| MediakitError::UnknownEntity(name.to_string()))
}

/// Look an entity up by kind. Infallible; the table covers the enum.
pub fn entity_for(kind: EntityKind) -> &'static EntityDef {
    match kind {
        EntityKind::AuthorityHook => &ENTITIES[0],
        EntityKind::Topics => &ENTITIES[1],
        EntityKind::Questions => &ENTITIES[2],
        EntityKind::Biography => &ENTITIES[3],
        EntityKind::Offers => &ENTITIES[4],
    }
}

pub fn entities() -> &'static [EntityDef] {
    &ENTITIES
}
