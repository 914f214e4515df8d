//! # Storage Layer
//!
//! Two independent stores persist the same logical content and drift
//! independently:
//!
//! 1. **Backend A, the form-entry store** ([`EntryBackend`]): a keyed
//!    attribute table, `entry_id -> { field_id -> value }`. This is where
//!    live edits land first, so it is the canonical source on conflict.
//! 2. **Backend B, the post-meta store** ([`MetaBackend`]): a generic
//!    key-value meta table, `post_id -> { meta_key -> value }`. This is the
//!    publication target, and it carries the per-entity `<entity>_updated`
//!    sync stamp as an ordinary meta key.
//!
//! The [`StorageAdapter`] trait is the closed contract both backends honor.
//! Adapters handle the "how" of their own native representation (single
//! field reads and writes, stamp bookkeeping) and nothing else. Conflict
//! resolution, merging, and dual-write sequencing belong to the
//! `ContentService`; an adapter never knows the other backend exists.
//!
//! ## Persistence
//!
//! Each backend keeps its table as a JSON file (`entries.json`,
//! `postmeta.json`) and rewrites it atomically (write to a tmp sibling,
//! then rename). Opened without a path, a backend runs purely in memory;
//! that mode also powers the test suites, together with write-error
//! simulation.
//!
//! ## Timestamps
//!
//! Every successful field write touches the owning entity's stamp in the
//! same backend. A malformed stamp value reads as missing rather than
//! erroring; the sync verifier then recommends regeneration, which rewrites
//! it. That is the self-healing path for corrupted side-channel data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mapping::{EntityDef, FieldBinding};
use crate::model::RecordRef;

pub mod entry_backend;
pub mod meta_backend;

pub use entry_backend::EntryBackend;
pub use meta_backend::MetaBackend;

/// The closed set of storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Backend A: the form-entry attribute table.
    Entry,
    /// Backend B: the post-meta key-value table.
    Meta,
}

impl BackendKind {
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Entry => "form entry store",
            BackendKind::Meta => "post meta store",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Abstract interface for one backend's raw field I/O.
///
/// Implementations perform atomic single-field reads/writes against their
/// own native representation. They never resolve conflicts and never touch
/// the other backend.
pub trait StorageAdapter {
    fn kind(&self) -> BackendKind;

    /// Whether this backend can address the record at all (has its id).
    fn available(&self, record: &RecordRef) -> bool;

    /// Whether this backend stores the given field for the record:
    /// the record carries this backend's id AND the field is mapped here.
    fn covers(&self, record: &RecordRef, binding: &FieldBinding) -> bool;

    /// Read one field value. `Ok(None)` when the record or field is absent;
    /// `Err` only for real storage failures.
    fn read_field(&self, record: &RecordRef, binding: &FieldBinding) -> Result<Option<String>>;

    /// Write one field value. Callers check [`covers`](Self::covers) first;
    /// writing an uncovered field is a storage error.
    fn write_field(&self, record: &RecordRef, binding: &FieldBinding, value: &str) -> Result<()>;

    /// Read the entity's last-modified stamp. Malformed stamps read as `None`.
    fn read_stamp(&self, record: &RecordRef, entity: &EntityDef) -> Result<Option<DateTime<Utc>>>;

    /// Set the entity's last-modified stamp to now.
    fn touch_stamp(&self, record: &RecordRef, entity: &EntityDef) -> Result<()>;
}
