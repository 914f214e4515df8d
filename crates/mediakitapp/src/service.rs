//! # Unified Data Service
//!
//! The reconciliation core. `ContentService` exclusively owns the
//! read/merge/write sequence across the two backends; the adapters only
//! ever perform single-field I/O against their own store.
//!
//! ## Load
//!
//! `load` reads every mapped field from backend A first and falls back to
//! backend B per field. On conflict A wins: the form-entry store is the
//! canonical live-edit source. Loading never fails on missing data: an
//! unknown record comes back as an entity with empty fields and quality
//! `missing`, and the caller decides what to do about it.
//!
//! ## Save
//!
//! `save` writes every resolvable field to **both** backends,
//! sequentially (A then B) so failures attribute cleanly. Writes are
//! independently committed: a failed B write never rolls back a
//! successful A write. Per-backend successes and failures are collected
//! into a [`SaveResult`]; one saved field on one backend is already a
//! partial success, never a hard failure. Unmapped field keys are dropped
//! with a warning. A value identical to what the backend already holds is
//! counted as saved without rewriting, which is what makes `save` and
//! `save_single` idempotent, including the sync-stamp side effect.
//!
//! Entities with a derived composite get it recomputed on every save from
//! the incoming values overlaid on current state; a submitted composite
//! value is ignored.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::mapping::{self, EntityDef, FieldBinding, HOOK_PLACEHOLDERS};
use crate::messages::OpMessage;
use crate::model::{
    authority_hook_sentence, is_filled, score_fields, Entity, EntityKind, FieldState, RecordRef,
};
use crate::store::{BackendKind, StorageAdapter};

/// One field that a backend rejected.
#[derive(Debug, Clone, Serialize)]
pub struct FieldFailure {
    pub field: String,
    pub detail: String,
}

/// Per-backend write bookkeeping for one save operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackendOutcome {
    pub saved: Vec<String>,
    pub failed: Vec<FieldFailure>,
}

impl BackendOutcome {
    pub fn any_saved(&self) -> bool {
        !self.saved.is_empty()
    }

    pub fn clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn attempted(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    FullSuccess,
    PartialSuccess,
    Failed,
}

/// Structured result of a dual-backend save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveResult {
    pub entity: EntityKind,
    /// Backend A (form entry store).
    pub entry: BackendOutcome,
    /// Backend B (post meta store).
    pub meta: BackendOutcome,
    /// Field keys dropped because they are unmapped or derived.
    pub skipped: Vec<String>,
    pub messages: Vec<OpMessage>,
}

impl SaveResult {
    fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            entry: BackendOutcome::default(),
            meta: BackendOutcome::default(),
            skipped: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn outcome(&self) -> SaveOutcome {
        let saved = self.entry.saved.len() + self.meta.saved.len();
        if saved == 0 {
            return SaveOutcome::Failed;
        }
        if self.entry.clean() && self.meta.clean() {
            SaveOutcome::FullSuccess
        } else {
            SaveOutcome::PartialSuccess
        }
    }

    pub fn attempted(&self) -> usize {
        self.entry.attempted().max(self.meta.attempted())
    }
}

/// The unified data service, generic over the two storage adapters.
pub struct ContentService<A: StorageAdapter, B: StorageAdapter> {
    entry: A,
    meta: B,
}

impl<A: StorageAdapter, B: StorageAdapter> ContentService<A, B> {
    pub fn new(entry: A, meta: B) -> Self {
        Self { entry, meta }
    }

    pub fn entry_backend(&self) -> &A {
        &self.entry
    }

    pub fn meta_backend(&self) -> &B {
        &self.meta
    }

    /// Load an entity, merging both backends. Never fails on missing data.
    pub fn load(&self, kind: EntityKind, record: &RecordRef) -> Result<Entity> {
        let def = mapping::entity_for(kind);
        let mut fields = Vec::with_capacity(def.fields.len());

        for binding in def.fields {
            let mut value = String::new();
            let mut source = None;

            // A first: the canonical live-edit source wins on conflict.
            if let Some(v) = self.entry.read_field(record, binding)? {
                if !v.trim().is_empty() {
                    value = v;
                    source = Some(BackendKind::Entry);
                }
            }
            if value.is_empty() {
                if let Some(v) = self.meta.read_field(record, binding)? {
                    if !v.trim().is_empty() {
                        value = v;
                        source = Some(BackendKind::Meta);
                    }
                }
            }

            fields.push(FieldState {
                key: binding.key.to_string(),
                value,
                source,
            });
        }

        if def.composite.is_some() {
            apply_composite_rule(def, &mut fields);
        }

        let quality = entity_quality(def, &fields);
        Ok(Entity {
            kind,
            fields,
            quality,
        })
    }

    /// Load by entity name; unknown names are a configuration error.
    pub fn load_named(&self, name: &str, record: &RecordRef) -> Result<Entity> {
        let def = mapping::entity(name)?;
        self.load(def.kind, record)
    }

    /// Dual-backend save of a set of fields.
    pub fn save(
        &self,
        kind: EntityKind,
        record: &RecordRef,
        fields: &[(String, String)],
    ) -> Result<SaveResult> {
        let def = mapping::entity_for(kind);
        let mut result = SaveResult::new(kind);
        let mut resolved: Vec<(&FieldBinding, String)> = Vec::new();

        for (key, value) in fields {
            match def.binding(key) {
                Some(b) if def.is_composite(b.key) => {
                    result.skipped.push(key.clone());
                    result.messages.push(OpMessage::warning(format!(
                        "'{}' is derived and recomputed on save; the submitted value was ignored",
                        key
                    )));
                }
                Some(b) => resolved.push((b, value.clone())),
                None => {
                    result.skipped.push(key.clone());
                    result.messages.push(OpMessage::warning(format!(
                        "Unknown field '{}' for {}; dropped",
                        key,
                        def.name()
                    )));
                }
            }
        }

        // Recompute the derived composite from the incoming values overlaid
        // on current state, so partial saves keep the sentence whole.
        if !resolved.is_empty() {
            if let Some(composite_key) = def.composite {
                let current = self.load(kind, record)?;
                let merged = |k: &str| -> String {
                    resolved
                        .iter()
                        .find(|(b, _)| b.key == k)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_else(|| current.get(k).unwrap_or("").to_string())
                };
                if let Some(rendered) = render_composite(def, &merged) {
                    if let Some(binding) = def.binding(composite_key) {
                        resolved.push((binding, rendered));
                    }
                }
            }
        }

        self.write_resolved(def, record, &resolved, &mut result)?;
        Ok(result)
    }

    /// Save by entity name; unknown names are a configuration error.
    pub fn save_named(
        &self,
        name: &str,
        record: &RecordRef,
        fields: &[(String, String)],
    ) -> Result<SaveResult> {
        let def = mapping::entity(name)?;
        self.save(def.kind, record, fields)
    }

    /// One-field save for autosave-on-blur. Same write discipline as
    /// [`save`](Self::save), and idempotent: repeating the call with the
    /// same value performs no writes and returns an identical result.
    pub fn save_single(
        &self,
        kind: EntityKind,
        record: &RecordRef,
        field_key: &str,
        value: &str,
    ) -> Result<SaveResult> {
        self.save(
            kind,
            record,
            &[(field_key.to_string(), value.to_string())],
        )
    }

    /// The entity's last-modified stamp: backend B's meta key is
    /// authoritative, backend A's side channel is the fallback.
    pub fn entity_stamp(
        &self,
        kind: EntityKind,
        record: &RecordRef,
    ) -> Result<Option<DateTime<Utc>>> {
        let def = mapping::entity_for(kind);
        if let Some(ts) = self.meta.read_stamp(record, def)? {
            return Ok(Some(ts));
        }
        self.entry.read_stamp(record, def)
    }

    /// Fallback path for the save orchestrator: write each field
    /// individually against backend B only, with its own error collection.
    pub fn fallback_write(
        &self,
        kind: EntityKind,
        record: &RecordRef,
        fields: &[(String, String)],
    ) -> Result<BackendOutcome> {
        let def = mapping::entity_for(kind);
        let mut outcome = BackendOutcome::default();
        let mut dirty = false;

        for (key, value) in fields {
            let binding = match def.binding(key) {
                Some(b) if !def.is_composite(b.key) => b,
                _ => continue,
            };
            write_one(&self.meta, record, binding, value, &mut outcome, &mut dirty);
        }

        if dirty {
            // Best effort: a missing stamp is recoverable, a lost field is not.
            let _ = self.meta.touch_stamp(record, def);
        }
        Ok(outcome)
    }

    fn write_resolved(
        &self,
        def: &EntityDef,
        record: &RecordRef,
        resolved: &[(&'static FieldBinding, String)],
        result: &mut SaveResult,
    ) -> Result<()> {
        let mut entry_dirty = false;
        let mut meta_dirty = false;

        for (binding, value) in resolved {
            write_one(
                &self.entry,
                record,
                binding,
                value,
                &mut result.entry,
                &mut entry_dirty,
            );
            write_one(
                &self.meta,
                record,
                binding,
                value,
                &mut result.meta,
                &mut meta_dirty,
            );
        }

        if entry_dirty {
            if let Err(e) = self.entry.touch_stamp(record, def) {
                result
                    .messages
                    .push(OpMessage::warning(format!("entry stamp update failed: {}", e)));
            }
        }
        if meta_dirty {
            if let Err(e) = self.meta.touch_stamp(record, def) {
                result
                    .messages
                    .push(OpMessage::warning(format!("meta stamp update failed: {}", e)));
            }
        }
        Ok(())
    }
}

/// Write one field to one backend, recording the outcome instead of
/// propagating. Values the backend already holds count as saved without a
/// physical write, so repeated saves cause no duplicate side effects.
fn write_one<S: StorageAdapter>(
    backend: &S,
    record: &RecordRef,
    binding: &FieldBinding,
    value: &str,
    outcome: &mut BackendOutcome,
    dirty: &mut bool,
) {
    if !backend.covers(record, binding) {
        return;
    }

    let current = match backend.read_field(record, binding) {
        Ok(v) => v,
        Err(e) => {
            outcome.failed.push(FieldFailure {
                field: binding.key.to_string(),
                detail: e.to_string(),
            });
            return;
        }
    };

    if current.as_deref() == Some(value) {
        outcome.saved.push(binding.key.to_string());
        return;
    }

    match backend.write_field(record, binding, value) {
        Ok(()) => {
            outcome.saved.push(binding.key.to_string());
            *dirty = true;
        }
        Err(e) => outcome.failed.push(FieldFailure {
            field: binding.key.to_string(),
            detail: e.to_string(),
        }),
    }
}

/// Quality over the entity's data fields (the composite is derived and
/// does not count).
fn entity_quality(def: &EntityDef, fields: &[FieldState]) -> crate::model::DataQuality {
    let flags: Vec<bool> = def
        .data_fields()
        .map(|binding| {
            fields
                .iter()
                .find(|f| f.key == binding.key)
                .map(|f| is_filled(&f.value, binding.placeholder))
                .unwrap_or(false)
        })
        .collect();
    score_fields(&flags, def.sequential)
}

fn render_composite(def: &EntityDef, value_of: &dyn Fn(&str) -> String) -> Option<String> {
    match def.kind {
        EntityKind::AuthorityHook => Some(authority_hook_sentence(
            &value_of("who"),
            &value_of("what"),
            &value_of("when"),
            &value_of("how"),
            HOOK_PLACEHOLDERS,
        )),
        _ => None,
    }
}

/// Composite override at load time: the composite is normally recomputed
/// from its components, but a previously saved composite survives as long
/// as every component still holds its placeholder default.
fn apply_composite_rule(def: &EntityDef, fields: &mut [FieldState]) {
    let composite_key = match def.composite {
        Some(k) => k,
        None => return,
    };

    let components_defaulted = def.data_fields().all(|binding| {
        fields
            .iter()
            .find(|f| f.key == binding.key)
            .map(|f| !is_filled(&f.value, binding.placeholder))
            .unwrap_or(true)
    });

    let saved_composite = fields
        .iter()
        .find(|f| f.key == composite_key)
        .map(|f| !f.value.trim().is_empty())
        .unwrap_or(false);

    if components_defaulted && saved_composite {
        return;
    }

    let lookup: Vec<(String, String)> = fields
        .iter()
        .map(|f| (f.key.clone(), f.value.clone()))
        .collect();
    let value_of = |k: &str| -> String {
        lookup
            .iter()
            .find(|(key, _)| key == k)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };
    if let Some(rendered) = render_composite(def, &value_of) {
        if let Some(f) = fields.iter_mut().find(|f| f.key == composite_key) {
            f.value = rendered;
            f.source = None;
        }
    }
}
