//! # Mediakit Architecture
//!
//! Mediakit is a **UI-agnostic content engine**. It generates and persists
//! media kit copy (authority hooks, topics, interview questions,
//! biographies, offers) across two storage backends that can drift
//! independently, and it knows how to tell when they have.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Request Boundary (dispatch.rs)                             │
//! │  - serde request/response shapes, legacy action names       │
//! │  - errors become structured responses, never panics         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Operations (orchestrator.rs, sync.rs, health.rs,           │
//! │              generator.rs)                                  │
//! │  - validation, dual-write coordination, fallback            │
//! │  - drift detection and health projection                    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Unified Data Service (service.rs)                          │
//! │  - owns the read/merge/write sequence                       │
//! │  - quality scoring, composite recomputation                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - StorageAdapter trait, exactly two backends               │
//! │  - EntryBackend (form entries), MetaBackend (post meta)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Explicit Over Ambient
//!
//! Nothing in the core reads request state, environment, or a "current
//! record" on its own. Record ids are resolved up front ([`resolver`]),
//! the field mapping is a static table ([`mapping`]), and every operation
//! takes plain arguments and returns plain `Result` types. The same core
//! serves the CLI, an HTTP handler, or a test harness unchanged.
//!
//! ## Execution Model
//!
//! Single-request, synchronous. Dual writes run sequentially (entry store
//! first, then meta store) so failures attribute cleanly, and each write
//! commits independently; there is no cross-backend transaction and no
//! rollback. Concurrent writers to the same record are not serialized;
//! the last writer for a given field wins.
//!
//! ## Module Overview
//!
//! - [`dispatch`]: the request boundary (operations enum, legacy names)
//! - [`orchestrator`]: validated dual-write with fallback state machine
//! - [`service`]: the reconciliation core
//! - [`sync`]: entity-to-entity drift detection
//! - [`health`]: the 0–100 data health projection
//! - [`generator`]: the text-generation collaborator contract
//! - [`store`]: the two storage backends
//! - [`mapping`]: the static field mapping table
//! - [`model`]: core types, quality scoring, composite rendering
//! - [`resolver`]: explicit record-id resolution
//! - [`config`]: TOML configuration
//! - [`messages`]: structured operation messages
//! - [`error`]: error types

pub mod config;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod health;
pub mod mapping;
pub mod messages;
pub mod model;
pub mod orchestrator;
pub mod resolver;
pub mod service;
pub mod store;
pub mod sync;
