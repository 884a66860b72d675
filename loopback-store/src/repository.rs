//! The entity repository: live collections plus their durable copy.

use std::fmt;
use std::sync::Arc;

use loopback_core::TenantId;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::StorageBackend;
use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::query::{self, PROTECTED_FIELDS};
use crate::seed;
use crate::snapshot::{StoreData, StoreSnapshot};
use crate::Record;

pub const DEFAULT_STORAGE_KEY: &str = "loopback-store";

/// What `load` found in the backing storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Restored,
    Seeded(ReseedReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReseedReason {
    Missing,
    Unreadable(String),
    Corrupt(String),
    Outdated { found: u32, expected: u32 },
}

impl fmt::Display for ReseedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReseedReason::Missing => f.write_str("no stored copy"),
            ReseedReason::Unreadable(e) => write!(f, "stored copy unreadable: {e}"),
            ReseedReason::Corrupt(e) => write!(f, "stored copy corrupt: {e}"),
            ReseedReason::Outdated { found, expected } => {
                write!(f, "stored copy is version {found}, expected {expected}")
            }
        }
    }
}

/// Multi-tenant record store persisted through a [`StorageBackend`].
///
/// Every mutation writes the whole snapshot back before returning. Write
/// failures are logged and swallowed; callers never see storage errors.
pub struct Repository {
    backend: Arc<dyn StorageBackend>,
    key: String,
    data: StoreData,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("backend", &self.backend)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl Repository {
    /// An empty repository. Call [`Repository::load`] before use.
    pub fn new(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            data: StoreData::empty(),
        }
    }

    /// `new` followed by `load`.
    pub fn open(backend: Arc<dyn StorageBackend>, key: impl Into<String>) -> Self {
        let mut repo = Self::new(backend, key);
        repo.load();
        repo
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Restore from the backing copy, or reseed and persist if it is
    /// missing, unparsable or from another store version.
    pub fn load(&mut self) -> LoadOutcome {
        let outcome = match self.read_stored() {
            Ok(data) => {
                self.data = data;
                LoadOutcome::Restored
            }
            Err(reason) => {
                warn!(key = %self.key, %reason, "reseeding store");
                self.data = seeded();
                self.commit();
                LoadOutcome::Seeded(reason)
            }
        };
        info!(key = %self.key, outcome = ?outcome, "store loaded");
        outcome
    }

    fn read_stored(&self) -> Result<StoreData, ReseedReason> {
        let raw = match self.backend.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(ReseedReason::Missing),
            Err(e) => return Err(ReseedReason::Unreadable(e.to_string())),
        };
        let snapshot =
            StoreSnapshot::parse(&raw).map_err(|e| ReseedReason::Corrupt(e.to_string()))?;
        StoreData::from_snapshot(snapshot).map_err(|e| match e {
            StoreError::VersionMismatch { found, expected } => {
                ReseedReason::Outdated { found, expected }
            }
            other => ReseedReason::Corrupt(other.to_string()),
        })
    }

    /// Write the current state to the backend.
    pub fn persist(&self) -> StoreResult<()> {
        let raw = self.data.to_snapshot().to_json()?;
        self.backend.write(&self.key, &raw)?;
        debug!(key = %self.key, bytes = raw.len(), "store persisted");
        Ok(())
    }

    fn commit(&self) {
        if let Err(e) = self.persist() {
            warn!(key = %self.key, error = %e, "failed to persist store");
        }
    }

    /// Discard runtime state and go back to the seeded dataset.
    pub fn reset(&mut self) {
        self.data = seeded();
        self.commit();
        info!(key = %self.key, "store reset to seeded dataset");
    }

    /// Final flush.
    pub fn shutdown(&mut self) {
        self.commit();
        info!(key = %self.key, "store shut down");
    }

    /// A copy of the full persisted aggregate.
    pub fn dump(&self) -> StoreSnapshot {
        self.data.to_snapshot()
    }

    pub fn get(&self, collection: Collection) -> &[Record] {
        self.data
            .collections
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn for_tenant(&self, collection: Collection, tenant: TenantId) -> Vec<&Record> {
        query::for_tenant(self.get(collection), tenant).collect()
    }

    pub fn find(&self, collection: Collection, id: i64) -> Option<&Record> {
        self.get(collection)
            .iter()
            .find(|r| query::record_id(r) == Some(id))
    }

    /// `find` restricted to records owned by `tenant`.
    pub fn find_for(&self, collection: Collection, tenant: TenantId, id: i64) -> Option<&Record> {
        self.find(collection, id).filter(|r| tenant.owns(r))
    }

    pub fn next_id(&self, collection: Collection) -> i64 {
        query::next_id(self.get(collection))
    }

    fn records_mut(&mut self, collection: Collection) -> &mut Vec<Record> {
        self.data.collections.entry(collection).or_default()
    }

    fn stamp_id(&self, collection: Collection, entity: &mut Record) {
        let missing = entity.get("id").and_then(Value::as_i64).is_none();
        if missing {
            if let Some(obj) = entity.as_object_mut() {
                obj.insert("id".into(), Value::from(self.next_id(collection)));
            }
        }
    }

    /// Append an entity, assigning `max(id) + 1` when it has no id.
    pub fn add(&mut self, collection: Collection, mut entity: Record) -> Record {
        self.stamp_id(collection, &mut entity);
        self.records_mut(collection).push(entity.clone());
        self.commit();
        entity
    }

    /// Like `add`, but inserts at the front (newest-first collections).
    pub fn prepend(&mut self, collection: Collection, mut entity: Record) -> Record {
        self.stamp_id(collection, &mut entity);
        self.records_mut(collection).insert(0, entity.clone());
        self.commit();
        entity
    }

    /// Shallow-merge `partial` into the record with `id`. Protected fields
    /// (`id`, `company_id`, `created_at`) are never overwritten.
    pub fn update(&mut self, collection: Collection, id: i64, partial: &Value) -> Option<Record> {
        self.modify(collection, id, |r| query::shallow_merge(r, partial, &PROTECTED_FIELDS))
    }

    /// `update` restricted to records owned by `tenant`.
    pub fn update_for(
        &mut self,
        collection: Collection,
        tenant: TenantId,
        id: i64,
        partial: &Value,
    ) -> Option<Record> {
        self.find_for(collection, tenant, id)?;
        self.update(collection, id, partial)
    }

    /// Apply `f` to the record with `id` and persist.
    pub fn modify<F>(&mut self, collection: Collection, id: i64, f: F) -> Option<Record>
    where
        F: FnOnce(&mut Record),
    {
        let record = self
            .records_mut(collection)
            .iter_mut()
            .find(|r| query::record_id(r) == Some(id))?;
        f(record);
        let updated = record.clone();
        self.commit();
        Some(updated)
    }

    /// Apply `f` to every record matching `pred`; persists once. Returns the count.
    pub fn modify_where<P, F>(&mut self, collection: Collection, pred: P, mut f: F) -> usize
    where
        P: Fn(&Record) -> bool,
        F: FnMut(&mut Record),
    {
        let mut n = 0;
        for record in self.records_mut(collection).iter_mut().filter(|r| pred(r)) {
            f(record);
            n += 1;
        }
        if n > 0 {
            self.commit();
        }
        n
    }

    pub fn remove(&mut self, collection: Collection, id: i64) -> bool {
        let records = self.records_mut(collection);
        let before = records.len();
        records.retain(|r| query::record_id(r) != Some(id));
        let removed = records.len() != before;
        if removed {
            self.commit();
        }
        removed
    }

    pub fn remove_for(&mut self, collection: Collection, tenant: TenantId, id: i64) -> bool {
        self.find_for(collection, tenant, id).is_some() && self.remove(collection, id)
    }

    pub fn dashboard(&self) -> &Value {
        &self.data.dashboard
    }

    pub fn settings(&self, tenant: TenantId) -> Option<&Value> {
        self.data.settings.get(&tenant.to_string())
    }

    /// Replace a tenant's settings document and persist.
    pub fn put_settings(&mut self, tenant: TenantId, settings: Value) -> Value {
        self.data.settings.insert(tenant.to_string(), settings.clone());
        self.commit();
        settings
    }
}

fn seeded() -> StoreData {
    // the seed is built with the current version, so conversion cannot fail
    StoreData::from_snapshot(seed::dataset()).unwrap_or_else(|_| StoreData::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryStorage;
    use serde_json::json;

    fn open() -> Repository {
        Repository::open(Arc::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY)
    }

    #[test]
    fn add_assigns_max_plus_one() {
        let mut repo = open();
        let next = repo.next_id(Collection::Tasks);
        let task = repo.add(Collection::Tasks, json!({"company_id": 101, "title": "x"}));
        assert_eq!(task["id"], next);
        assert_eq!(repo.get(Collection::Tasks).last(), Some(&task));
    }

    #[test]
    fn prepend_inserts_first() {
        let mut repo = open();
        let n = repo.prepend(Collection::Notifications, json!({"company_id": 101, "title": "hi"}));
        assert_eq!(repo.get(Collection::Notifications).first(), Some(&n));
    }

    #[test]
    fn tenant_scoped_mutations_ignore_foreign_records() {
        let mut repo = open();
        // employee 9 belongs to 202
        assert!(repo
            .update_for(Collection::Employees, TenantId(101), 9, &json!({"position": "x"}))
            .is_none());
        assert!(!repo.remove_for(Collection::Employees, TenantId(101), 9));
        assert!(repo.find(Collection::Employees, 9).is_some());
    }

    #[test]
    fn modify_where_counts_matches() {
        let mut repo = open();
        let n = repo.modify_where(
            Collection::Notifications,
            |r| r["user_id"] == 1,
            |r| r["read"] = json!(true),
        );
        assert_eq!(n, 2);
    }
}
