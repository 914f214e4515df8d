use super::{BackendKind, StorageAdapter};
use crate::error::{MediakitError, Result};
use crate::mapping::{EntityDef, FieldBinding};
use crate::model::RecordRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const TABLE_FILE: &str = "entries.json";

/// One form entry's stored attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct EntryRecord {
    /// Attribute table: numeric field id (as string) -> value.
    #[serde(default)]
    fields: HashMap<String, String>,
    /// Per-entity last-modified stamps, keyed by `<entity>_updated`.
    #[serde(default)]
    stamps: HashMap<String, DateTime<Utc>>,
}

/// Backend A: the form-entry store.
///
/// Uses `RefCell` for interior mutability: execution is single-request
/// and single-threaded, so the trait can take `&self` everywhere.
pub struct EntryBackend {
    path: Option<PathBuf>,
    table: RefCell<HashMap<u64, EntryRecord>>,
    simulate_write_error: RefCell<bool>,
    fail_next_writes: RefCell<u32>,
}

impl EntryBackend {
    /// Open the store rooted at `dir`, loading `entries.json` if present.
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
    pub fn set_stamp(&self, entry_id: u64, entity: &EntityDef, when: DateTime<Utc>) -> Result<()> {
        self.table
            .borrow_mut()
            .entry(entry_id)
            .or_default()
            .stamps
            .insert(entity.stamp_key(), when);
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

    fn entry_id(&self, record: &RecordRef) -> Result<u64> {
        record.entry_id.ok_or_else(|| {
            MediakitError::Store("form entry store cannot address a record without an entry id".to_string())
        })
    }
}

impl StorageAdapter for EntryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Entry
    }

    fn available(&self, record: &RecordRef) -> bool {
        record.entry_id.is_some()
    }

    fn covers(&self, record: &RecordRef, binding: &FieldBinding) -> bool {
        record.entry_id.is_some() && binding.entry_field.is_some()
    }

    fn read_field(&self, record: &RecordRef, binding: &FieldBinding) -> Result<Option<String>> {
        let entry_id = match record.entry_id {
            Some(id) => id,
            None => return Ok(None),
        };
        let field_id = match binding.entry_field {
            Some(id) => id,
            None => return Ok(None),
        };
        let table = self.table.borrow();
        Ok(table
            .get(&entry_id)
            .and_then(|rec| rec.fields.get(field_id))
            .cloned())
    }

    fn write_field(&self, record: &RecordRef, binding: &FieldBinding, value: &str) -> Result<()> {
        if self.take_injected_failure() {
            return Err(MediakitError::BackendWrite {
                backend: BackendKind::Entry,
                field: binding.key.to_string(),
                detail: "simulated write failure".to_string(),
            });
        }
        let entry_id = self.entry_id(record)?;
        let field_id = binding.entry_field.ok_or_else(|| {
            MediakitError::Store(format!(
                "'{}' is not mapped in the form entry store",
                binding.key
            ))
        })?;

        self.table
            .borrow_mut()
            .entry(entry_id)
            .or_default()
            .fields
            .insert(field_id.to_string(), value.to_string());
        self.persist()
    }

    fn read_stamp(&self, record: &RecordRef, entity: &EntityDef) -> Result<Option<DateTime<Utc>>> {
        let entry_id = match record.entry_id {
            Some(id) => id,
            None => return Ok(None),
        };
        let table = self.table.borrow();
        Ok(table
            .get(&entry_id)
            .and_then(|rec| rec.stamps.get(&entity.stamp_key()))
            .copied())
    }

    fn touch_stamp(&self, record: &RecordRef, entity: &EntityDef) -> Result<()> {
        let entry_id = self.entry_id(record)?;
        self.table
            .borrow_mut()
            .entry(entry_id)
            .or_default()
            .stamps
            .insert(entity.stamp_key(), Utc::now());
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping;

    fn topic_1() -> &'static FieldBinding {
        mapping::entity_for(crate::model::EntityKind::Topics)
            .binding("topic_1")
            .unwrap()
    }

    #[test]
    fn write_then_read_round_trips() {
        let backend = EntryBackend::in_memory();
        let record = RecordRef::entry(301);

        backend
            .write_field(&record, topic_1(), "Scaling without burnout")
            .unwrap();
        let value = backend.read_field(&record, topic_1()).unwrap();
        assert_eq!(value.as_deref(), Some("Scaling without burnout"));
    }

    #[test]
    fn read_missing_record_is_none() {
        let backend = EntryBackend::in_memory();
        let record = RecordRef::entry(999);
        assert_eq!(backend.read_field(&record, topic_1()).unwrap(), None);
    }

    #[test]
    fn read_without_entry_id_is_none_not_error() {
        let backend = EntryBackend::in_memory();
        let record = RecordRef::post(42);
        assert_eq!(backend.read_field(&record, topic_1()).unwrap(), None);
        assert!(!backend.available(&record));
        assert!(!backend.covers(&record, topic_1()));
    }

    #[test]
    fn write_without_entry_id_is_an_error() {
        let backend = EntryBackend::in_memory();
        let record = RecordRef::post(42);
        assert!(backend.write_field(&record, topic_1(), "x").is_err());
    }

    #[test]
    fn meta_only_fields_are_not_covered() {
        let backend = EntryBackend::in_memory();
        let record = RecordRef::entry(301);
        let bio_long = mapping::entity_for(crate::model::EntityKind::Biography)
            .binding("bio_long")
            .unwrap();
        assert!(!backend.covers(&record, bio_long));
        assert_eq!(backend.read_field(&record, bio_long).unwrap(), None);
    }

    #[test]
    fn simulated_write_error_surfaces_as_backend_write() {
        let backend = EntryBackend::in_memory();
        backend.set_simulate_write_error(true);
        let record = RecordRef::entry(301);

        let err = backend.write_field(&record, topic_1(), "x").unwrap_err();
        assert!(matches!(
            err,
            MediakitError::BackendWrite {
                backend: BackendKind::Entry,
                ..
            }
        ));
    }

    #[test]
    fn touch_stamp_then_read_back() {
        let backend = EntryBackend::in_memory();
        let record = RecordRef::entry(301);
        let topics = mapping::entity_for(crate::model::EntityKind::Topics);

        assert_eq!(backend.read_stamp(&record, topics).unwrap(), None);
        backend.touch_stamp(&record, topics).unwrap();
        let stamp = backend.read_stamp(&record, topics).unwrap().unwrap();
        assert!(Utc::now().signed_duration_since(stamp).num_seconds() < 5);
    }
}
