use super::{BackendKind, StorageAdapter};
use crate::error::{MediakitError, Result};
use crate::mapping::{EntityDef, FieldBinding};
use crate::model::RecordRef;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const TABLE_FILE: &str = "postmeta.json";

/// Backend B: the post-meta store.
///
/// Everything is a string under a meta key, including the per-entity
/// `<entity>_updated` stamps (RFC 3339); that is the native representation
/// of a generic meta table. A stamp that fails to parse reads as missing.
pub struct MetaBackend {
    path: Option<PathBuf>,
    table: RefCell<HashMap<u64, HashMap<String, String>>>,
    simulate_write_error: RefCell<bool>,
    fail_next_writes: RefCell<u32>,
}

impl MetaBackend {
    /// Open the store rooted at `dir`, loading `postmeta.json` if present.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(TABLE_FILE);
        let table = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(MediakitError::Io)?;
            serde_json::from_str(&raw).map_err(MediakitError::Serialization)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path: Some(path),
            table: RefCell::new(table),
            simulate_write_error: RefCell::new(false),
            fail_next_writes: RefCell::new(0),
        })
    }

    /// A purely in-memory store (tests, dry runs).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            table: RefCell::new(HashMap::new()),
            simulate_write_error: RefCell::new(false),
            fail_next_writes: RefCell::new(0),
        }
    }

    /// Make every subsequent field write fail, for error-path testing.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Fail only the next `n` field writes, as in a transient outage.
    pub fn fail_next_writes(&self, n: u32) {
        *self.fail_next_writes.borrow_mut() = n;
    }

    fn take_injected_failure(&self) -> bool {
        if *self.simulate_write_error.borrow() {
            return true;
        }
        let mut remaining = self.fail_next_writes.borrow_mut();
        if *remaining > 0 {
            *remaining -= 1;
            return true;
        }
        false
    }

    /// Test helper: set an entity stamp directly for drift scenarios.
    pub fn set_stamp(&self, post_id: u64, entity: &EntityDef, when: DateTime<Utc>) -> Result<()> {
        self.table
            .borrow_mut()
            .entry(post_id)
            .or_default()
            .insert(entity.stamp_key(), when.to_rfc3339());
        self.persist()
    }

    /// Test helper: plant a raw meta value (e.g. a corrupted stamp).
    pub fn set_raw_meta(&self, post_id: u64, meta_key: &str, value: &str) -> Result<()> {
        self.table
            .borrow_mut()
            .entry(post_id)
            .or_default()
            .insert(meta_key.to_string(), value.to_string());
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let path = match &self.path {
            Some(p) => p,
            None => return Ok(()),
        };
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(MediakitError::Io)?;
            }
        }
        let raw = serde_json::to_string_pretty(&*self.table.borrow())
            .map_err(MediakitError::Serialization)?;

        // Atomic write: tmp sibling, then rename.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(MediakitError::Io)?;
        fs::rename(&tmp, path).map_err(MediakitError::Io)?;
        Ok(())
    }

    fn post_id(&self, record: &RecordRef) -> Result<u64> {
        record.post_id.ok_or_else(|| {
            MediakitError::Store("post meta store cannot address a record without a post id".to_string())
        })
    }
}

impl StorageAdapter for MetaBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Meta
    }

    fn available(&self, record: &RecordRef) -> bool {
        record.post_id.is_some()
    }

    fn covers(&self, record: &RecordRef, binding: &FieldBinding) -> bool {
        record.post_id.is_some() && binding.meta_key.is_some()
    }

    fn read_field(&self, record: &RecordRef, binding: &FieldBinding) -> Result<Option<String>> {
        let post_id = match record.post_id {
            Some(id) => id,
            None => return Ok(None),
        };
        let meta_key = match binding.meta_key {
            Some(k) => k,
            None => return Ok(None),
        };
        let table = self.table.borrow();
        Ok(table
            .get(&post_id)
            .and_then(|meta| meta.get(meta_key))
            .cloned())
    }

    fn write_field(&self, record: &RecordRef, binding: &FieldBinding, value: &str) -> Result<()> {
        if self.take_injected_failure() {
            return Err(MediakitError::BackendWrite {
                backend: BackendKind::Meta,
                field: binding.key.to_string(),
                detail: "simulated write failure".to_string(),
            });
        }
        let post_id = self.post_id(record)?;
        let meta_key = binding.meta_key.ok_or_else(|| {
            MediakitError::Store(format!(
                "'{}' is not mapped in the post meta store",
                binding.key
            ))
        })?;

        self.table
            .borrow_mut()
            .entry(post_id)
            .or_default()
            .insert(meta_key.to_string(), value.to_string());
        self.persist()
    }

    fn read_stamp(&self, record: &RecordRef, entity: &EntityDef) -> Result<Option<DateTime<Utc>>> {
        let post_id = match record.post_id {
            Some(id) => id,
            None => return Ok(None),
        };
        let table = self.table.borrow();
        let raw = match table.get(&post_id).and_then(|m| m.get(&entity.stamp_key())) {
            Some(raw) => raw.clone(),
            None => return Ok(None),
        };
        // Malformed stamps read as missing; regeneration rewrites them.
        Ok(DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)))
    }

    fn touch_stamp(&self, record: &RecordRef, entity: &EntityDef) -> Result<()> {
        let post_id = self.post_id(record)?;
        self.table
            .borrow_mut()
            .entry(post_id)
            .or_default()
            .insert(entity.stamp_key(), Utc::now().to_rfc3339());
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;
    use crate::model::EntityKind;

    fn topics() -> &'static EntityDef {
        mapping::entity_for(EntityKind::Topics)
    }

    fn topic_1() -> &'static FieldBinding {
        topics().binding("topic_1").unwrap()
    }

    #[test]
    fn write_then_read_round_trips() {
        let backend = MetaBackend::in_memory();
        let record = RecordRef::post(7401);

        backend
            .write_field(&record, topic_1(), "Hiring your first team")
            .unwrap();
        let value = backend.read_field(&record, topic_1()).unwrap();
        assert_eq!(value.as_deref(), Some("Hiring your first team"));
    }

    #[test]
    fn read_without_post_id_is_none_not_error() {
        let backend = MetaBackend::in_memory();
        let record = RecordRef::entry(301);
        assert_eq!(backend.read_field(&record, topic_1()).unwrap(), None);
        assert!(!backend.available(&record));
    }

    #[test]
    fn stamp_is_stored_as_a_plain_meta_value() {
        let backend = MetaBackend::in_memory();
        let record = RecordRef::post(7401);

        backend.touch_stamp(&record, topics()).unwrap();

        // The stamp is readable back as a parsed timestamp...
        let stamp = backend.read_stamp(&record, topics()).unwrap().unwrap();
        assert!(Utc::now().signed_duration_since(stamp).num_seconds() < 5);

        // ...and lives under the ordinary meta key.
        let raw = backend
            .table
            .borrow()
            .get(&7401)
            .and_then(|m| m.get("topics_updated"))
            .cloned();
        assert!(raw.is_some());
    }

    #[test]
    fn malformed_stamp_reads_as_missing() {
        let backend = MetaBackend::in_memory();
        let record = RecordRef::post(7401);

        backend
            .set_raw_meta(7401, "topics_updated", "not-a-timestamp")
            .unwrap();
        assert_eq!(backend.read_stamp(&record, topics()).unwrap(), None);
    }

    #[test]
    fn simulated_write_error_surfaces_as_backend_write() {
        let backend = MetaBackend::in_memory();
        backend.set_simulate_write_error(true);
        let record = RecordRef::post(7401);

        let err = backend.write_field(&record, topic_1(), "x").unwrap_err();
        assert!(matches!(
            err,
            MediakitError::BackendWrite {
                backend: BackendKind::Meta,
                ..
            }
        ));
    }
}
