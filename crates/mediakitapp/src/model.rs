//! # Domain Model: Entities, Records, and Data Quality
//!
//! This module defines the core data structures: [`EntityKind`], [`RecordRef`],
//! [`Entity`], and [`DataQuality`]. It also implements the two deterministic
//! algorithms everything else leans on: quality scoring and composite
//! rendering.
//!
//! ## Records
//!
//! A record is addressed by up to two ids, one per storage backend:
//! the form-entry id (backend A) and the post id (backend B). At least one
//! must be present; a record with neither is invalid and fails fast at
//! construction, never silently defaults.
//!
//! ## Quality Scoring
//!
//! An entity's quality is a pure function of its current field values:
//!
//! 1. Count `filled` = fields that are non-empty after trimming and do not
//!    equal their placeholder default.
//! 2. `filled == 0` → `Missing`.
//! 3. Otherwise `ratio = filled / total`:
//!    - `>= 0.9` → `Excellent`
//!    - `>= 0.7` → `Good`
//!    - `>  0.4` → `Fair`
//!    - else     → `Poor`
//! 4. For ordered entities (topics, questions, offers), a **gap** (a
//!    populated slot after one or more empty slots) caps the rating at
//!    `Poor` regardless of the count.
//!
//! Derived composite fields are excluded from the count; they restate the
//! components rather than add information.
//!
//! ## The Authority Hook Composite
//!
//! `complete` is always a deterministic function of the four components:
//!
//! ```text
//! I help {who} {what} when {when} {how}.
//! ```
//!
//! Empty components fall back to their placeholder defaults so the sentence
//! always reads whole. The composite is recomputed on save, never edited on
//! its own. The one exception is at load time: when every component still
//! holds its placeholder default but a composite was saved earlier, the
//! saved composite wins.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{MediakitError, Result};
use crate::store::BackendKind;

/// The closed set of content entities the system persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    AuthorityHook,
    Topics,
    Questions,
    Biography,
    Offers,
}

impl EntityKind {
    /// Canonical entity name, as used in requests and meta keys.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::AuthorityHook => "authority_hook",
            EntityKind::Topics => "topics",
            EntityKind::Questions => "questions",
            EntityKind::Biography => "biography",
            EntityKind::Offers => "offers",
        }
    }

    /// Human label for messages ("interview questions", not "questions").
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::AuthorityHook => "authority hook",
            EntityKind::Topics => "topics",
            EntityKind::Questions => "interview questions",
            EntityKind::Biography => "biography",
            EntityKind::Offers => "offers",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "authority_hook" => Ok(EntityKind::AuthorityHook),
            "topics" => Ok(EntityKind::Topics),
            "questions" => Ok(EntityKind::Questions),
            "biography" => Ok(EntityKind::Biography),
            "offers" => Ok(EntityKind::Offers),
            other => Err(MediakitError::UnknownEntity(other.to_string())),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved record: at least one backend id is guaranteed present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub entry_id: Option<u64>,
    pub post_id: Option<u64>,
}

impl RecordRef {
    /// Build a record reference, failing fast when neither id is given.
    pub fn new(entry_id: Option<u64>, post_id: Option<u64>) -> Result<Self> {
        if entry_id.is_none() && post_id.is_none() {
            return Err(MediakitError::RecordNotFound);
        }
        Ok(Self { entry_id, post_id })
    }

    pub fn entry(entry_id: u64) -> Self {
        Self {
            entry_id: Some(entry_id),
            post_id: None,
        }
    }

    pub fn post(post_id: u64) -> Self {
        Self {
            entry_id: None,
            post_id: Some(post_id),
        }
    }

    pub fn both(entry_id: u64, post_id: u64) -> Self {
        Self {
            entry_id: Some(entry_id),
            post_id: Some(post_id),
        }
    }
}

/// Categorical completeness/consistency rating for an entity's fields.
///
/// Ordered so that `Missing < Poor < Fair < Good < Excellent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    Missing,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl DataQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataQuality::Missing => "missing",
            DataQuality::Poor => "poor",
            DataQuality::Fair => "fair",
            DataQuality::Good => "good",
            DataQuality::Excellent => "excellent",
        }
    }
}

/// One logical field's current value, with the backend it was read from.
#[derive(Debug, Clone, Serialize)]
pub struct FieldState {
    pub key: String,
    pub value: String,
    /// Which backend supplied the value on load. `None` for empty fields
    /// and for values produced locally (e.g. a recomputed composite).
    pub source: Option<BackendKind>,
}

/// A named group of logical fields loaded as one unit.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub fields: Vec<FieldState>,
    pub quality: DataQuality,
}

impl Entity {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
    }

    /// True when no field holds a meaningful (non-empty) value.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|f| f.value.trim().is_empty())
    }
}

/// Whether a value counts as filled: non-empty and not the placeholder default.
pub fn is_filled(value: &str, placeholder: Option<&str>) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    match placeholder {
        Some(p) => trimmed != p,
        None => true,
    }
}

/// A populated slot after one or more empty slots.
fn has_gap(filled: &[bool]) -> bool {
    let mut seen_empty = false;
    for &f in filled {
        if !f {
            seen_empty = true;
        } else if seen_empty {
            return true;
        }
    }
    false
}

/// The quality scoring algorithm. `filled` is one flag per expected field,
/// in sequence order; `sequential` enables gap detection.
pub fn score_fields(filled: &[bool], sequential: bool) -> DataQuality {
    let total = filled.len();
    let count = filled.iter().filter(|f| **f).count();
    if total == 0 || count == 0 {
        return DataQuality::Missing;
    }

    let ratio = count as f64 / total as f64;
    let mut rating = if ratio >= 0.9 {
        DataQuality::Excellent
    } else if ratio >= 0.7 {
        DataQuality::Good
    } else if ratio > 0.4 {
        DataQuality::Fair
    } else {
        DataQuality::Poor
    };

    // Gaps cap the rating: a sequence with holes reads broken no matter
    // how many later slots are filled.
    if sequential && has_gap(filled) && rating > DataQuality::Poor {
        rating = DataQuality::Poor;
    }
    rating
}

/// Render the complete authority hook sentence from its components.
/// Empty components fall back to the given placeholder defaults.
pub fn authority_hook_sentence(
    who: &str,
    what: &str,
    when: &str,
    how: &str,
    defaults: [&str; 4],
) -> String {
    let pick = |value: &str, default: &str| -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            default.to_string()
        } else {
            trimmed.to_string()
        }
    };
    format!(
        "I help {} {} when {} {}.",
        pick(who, defaults[0]),
        pick(what, defaults[1]),
        pick(when, defaults[2]),
        pick(how, defaults[3]),
    )
}

/// Compact human formatting for a sync lag ("4m 10s", "2h 5m", "45s").
pub fn format_lag(lag: Duration) -> String {
    let secs = lag.num_seconds().abs();
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}
