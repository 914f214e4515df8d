//! # Record Resolution
//!
//! The core only ever works with an explicit [`RecordRef`]. Everything
//! ambient (URL parameters, a lookup slug, the "current record" of a
//! request context) is resolved here, at the boundary, in a fixed order:
//!
//! 1. explicit ids,
//! 2. a lookup key through a caller-supplied directory,
//! 3. the ambient current-record context,
//! 4. failure (`RecordNotFound`).
//!
//! No step silently defaults: a resolved record still must carry at least
//! one backend id or resolution fails fast.

use crate::error::{MediakitError, Result};
use crate::model::RecordRef;

/// The "current record" a transport layer may carry (e.g. the post being
/// edited). Plain data, supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientRecord {
    pub entry_id: Option<u64>,
    pub post_id: Option<u64>,
}

/// Resolve a record from the available hints, in priority order.
///
/// `directory` maps a lookup key (e.g. an entry slug) to a record; it is
/// whatever index the caller has at hand.
pub fn resolve_record<F>(
    explicit_entry: Option<u64>,
    explicit_post: Option<u64>,
    lookup_key: Option<&str>,
    directory: F,
    ambient: Option<&AmbientRecord>,
) -> Result<RecordRef>
where
    F: Fn(&str) -> Option<RecordRef>,
{
    if explicit_entry.is_some() || explicit_post.is_some() {
        return RecordRef::new(explicit_entry, explicit_post);
    }

    if let Some(key) = lookup_key {
        return directory(key).ok_or(MediakitError::RecordNotFound);
    }

    if let Some(ambient) = ambient {
        return RecordRef::new(ambient.entry_id, ambient.post_id);
    }

    Err(MediakitError::RecordNotFound)
}
