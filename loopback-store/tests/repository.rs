use std::sync::Arc;

use loopback_core::TenantId;
use loopback_store::{
    seed, Collection, FileStorage, LoadOutcome, MemoryStorage, Repository, ReseedReason,
    StorageBackend, StoreError, StoreResult, DEFAULT_STORAGE_KEY, STORE_VERSION,
};
use serde_json::json;

fn open_memory(storage: &MemoryStorage) -> (Repository, LoadOutcome) {
    let mut repo = Repository::new(Arc::new(storage.clone()), DEFAULT_STORAGE_KEY);
    let outcome = repo.load();
    (repo, outcome)
}

#[test]
fn first_load_seeds_and_persists() {
    let storage = MemoryStorage::new();
    let (repo, outcome) = open_memory(&storage);

    assert_eq!(outcome, LoadOutcome::Seeded(ReseedReason::Missing));
    assert_eq!(repo.dump(), seed::dataset());
    assert!(storage.read(DEFAULT_STORAGE_KEY).unwrap().is_some());
}

#[test]
fn mutations_survive_a_reload() {
    let storage = MemoryStorage::new();
    let (mut repo, _) = open_memory(&storage);

    let created = repo.add(
        Collection::Employees,
        json!({"company_id": 101, "first_name": "Nina", "created_at": "2024-07-01T00:00:00+00:00"}),
    );
    let id = created["id"].as_i64().unwrap();
    repo.update(Collection::Projects, 1, &json!({"progress": 80}));
    assert!(repo.remove(Collection::Tasks, 2));

    let (reloaded, outcome) = open_memory(&storage);
    assert_eq!(outcome, LoadOutcome::Restored);
    assert_eq!(reloaded.find(Collection::Employees, id), Some(&created));
    assert_eq!(reloaded.find(Collection::Projects, 1).unwrap()["progress"], 80);
    assert!(reloaded.find(Collection::Tasks, 2).is_none());
    assert_eq!(reloaded.dump(), repo.dump());
}

#[test]
fn file_backed_store_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let backend: Arc<dyn StorageBackend> = Arc::new(FileStorage::new(dir.path()));

    let mut repo = Repository::open(backend.clone(), "hr");
    repo.put_settings(TenantId(101), json!({"company_name": "Acme Renamed"}));
    drop(repo);

    let mut reloaded = Repository::new(backend, "hr");
    assert_eq!(reloaded.load(), LoadOutcome::Restored);
    assert_eq!(
        reloaded.settings(TenantId(101)).unwrap()["company_name"],
        "Acme Renamed"
    );
    assert!(dir.path().join("hr.json").exists());
}

#[test]
fn reset_is_idempotent_and_equals_the_seed() {
    let storage = MemoryStorage::new();
    let (mut repo, _) = open_memory(&storage);
    repo.add(Collection::Tickets, json!({"company_id": 202, "subject": "noise"}));
    repo.remove(Collection::Users, 1);

    repo.reset();
    let first = repo.dump();
    repo.reset();
    let second = repo.dump();

    assert_eq!(first, second);
    assert_eq!(first, seed::dataset());

    let (reloaded, _) = open_memory(&storage);
    assert_eq!(reloaded.dump(), first);
}

#[test]
fn tenant_views_never_leak_across_tenants() {
    let storage = MemoryStorage::new();
    let (repo, _) = open_memory(&storage);

    for c in Collection::ALL {
        for tenant in [101, 202] {
            for record in repo.for_tenant(c, TenantId(tenant)) {
                assert_eq!(record["company_id"], tenant, "{c}");
            }
        }
    }
    assert!(repo.find_for(Collection::Employees, TenantId(202), 1).is_none());
    assert!(repo.find_for(Collection::Employees, TenantId(101), 1).is_some());
}

#[test]
fn corrupt_copy_is_reseeded() {
    let storage = MemoryStorage::new();
    storage.write(DEFAULT_STORAGE_KEY, "{ not json").unwrap();

    let (repo, outcome) = open_memory(&storage);
    assert!(matches!(outcome, LoadOutcome::Seeded(ReseedReason::Corrupt(_))));
    assert_eq!(repo.dump(), seed::dataset());

    let healed = storage.read(DEFAULT_STORAGE_KEY).unwrap().unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&healed).is_ok());
}

#[test]
fn outdated_copy_is_reseeded() {
    let storage = MemoryStorage::new();
    let stale = json!({"version": STORE_VERSION + 1, "collections": {"users": []}});
    storage.write(DEFAULT_STORAGE_KEY, &stale.to_string()).unwrap();

    let (repo, outcome) = open_memory(&storage);
    assert_eq!(
        outcome,
        LoadOutcome::Seeded(ReseedReason::Outdated {
            found: STORE_VERSION + 1,
            expected: STORE_VERSION
        })
    );
    assert!(!repo.get(Collection::Users).is_empty());
}

#[test]
fn missing_collections_materialize_empty() {
    let storage = MemoryStorage::new();
    let partial = json!({"version": STORE_VERSION, "collections": {"users": [{"id": 1, "company_id": 101}]}});
    storage.write(DEFAULT_STORAGE_KEY, &partial.to_string()).unwrap();

    let (mut repo, outcome) = open_memory(&storage);
    assert_eq!(outcome, LoadOutcome::Restored);
    assert!(repo.get(Collection::Goals).is_empty());

    let goal = repo.add(Collection::Goals, json!({"company_id": 101}));
    assert_eq!(goal["id"], 1);
}

#[test]
fn update_never_touches_protected_fields() {
    let storage = MemoryStorage::new();
    let (mut repo, _) = open_memory(&storage);

    let before = repo.find(Collection::Assets, 1).cloned().unwrap();
    let after = repo
        .update_for(
            Collection::Assets,
            TenantId(101),
            1,
            &json!({"id": 77, "company_id": 202, "created_at": "later", "status": "retired"}),
        )
        .unwrap();

    assert_eq!(after["id"], before["id"]);
    assert_eq!(after["company_id"], before["company_id"]);
    assert_eq!(after["created_at"], before["created_at"]);
    assert_eq!(after["status"], "retired");
}

/// Storage whose writes always fail, like a full disk.
#[derive(Debug)]
struct ReadOnlyStorage;

impl StorageBackend for ReadOnlyStorage {
    fn read(&self, _key: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }

    fn write(&self, _key: &str, _contents: &str) -> StoreResult<()> {
        Err(StoreError::backend("disk full"))
    }

    fn remove(&self, _key: &str) -> StoreResult<()> {
        Ok(())
    }
}

#[test]
fn write_failures_never_reach_the_caller() {
    let mut repo = Repository::open(Arc::new(ReadOnlyStorage), DEFAULT_STORAGE_KEY);
    assert_eq!(repo.dump(), seed::dataset());
    assert!(repo.persist().is_err());

    let created = repo.add(
        Collection::Departments,
        json!({"company_id": 101, "name": "Legal"}),
    );
    assert_eq!(created["name"], "Legal");
    let id = created["id"].as_i64().unwrap();

    let updated = repo
        .update(Collection::Departments, id, &json!({"name": "Legal & Compliance"}))
        .unwrap();
    assert_eq!(updated["name"], "Legal & Compliance");
    assert_eq!(repo.find(Collection::Departments, id), Some(&updated));

    assert!(repo.remove(Collection::Departments, id));
    assert!(repo.find(Collection::Departments, id).is_none());

    repo.reset();
    repo.shutdown();
    assert_eq!(repo.dump(), seed::dataset());
}
