use crate::store::BackendKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediakitError {
    /// Configuration problem: the entity name is not in the field mapping table.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// No resolvable record id. A record needs at least one backend id.
    #[error("No resolvable record id (need an entry id or a post id)")]
    RecordNotFound,

    /// A single backend rejected a write. Recorded per-field by the service,
    /// surfaced only when the fallback path also fails.
    #[error("{backend} write failed for '{field}': {detail}")]
    BackendWrite {
        backend: BackendKind,
        field: String,
        detail: String,
    },

    /// Pre-save validation failed. Carries the full list of violations;
    /// nothing is auto-corrected.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The text-generation collaborator reported a failure.
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, MediakitError>;
