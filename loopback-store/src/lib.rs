//! loopback-store: the simulator's persisted, multi-tenant entity repository.
//!
//! Records are plain JSON objects grouped into a closed set of
//! [`Collection`]s. The whole store is serialized as one [`StoreSnapshot`]
//! and written through a [`StorageBackend`] after every mutation.

pub mod backend;
pub mod collection;
pub mod error;
pub mod query;
pub mod repository;
pub mod seed;
pub mod snapshot;

pub use backend::{FileStorage, MemoryStorage, StorageBackend};
pub use collection::Collection;
pub use error::{StoreError, StoreResult};
pub use repository::{LoadOutcome, ReseedReason, Repository, DEFAULT_STORAGE_KEY};
pub use snapshot::{StoreSnapshot, STORE_VERSION};

/// A stored entity: a JSON object with at least a numeric `id`.
pub type Record = serde_json::Value;
