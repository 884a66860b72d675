use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::Record;

/// Bumped whenever the seeded shape changes; older copies are reseeded.
pub const STORE_VERSION: u32 = 1;

/// The persisted aggregate: every collection plus dashboard series and
/// per-tenant settings documents (keyed by tenant id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub collections: BTreeMap<String, Vec<Record>>,
    #[serde(default)]
    pub dashboard: Value,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
}

/// In-memory form of a snapshot with collections keyed by the enum.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StoreData {
    pub collections: BTreeMap<Collection, Vec<Record>>,
    pub dashboard: Value,
    pub settings: BTreeMap<String, Value>,
}

impl StoreData {
    pub fn empty() -> Self {
        Self {
            collections: Collection::ALL.into_iter().map(|c| (c, Vec::new())).collect(),
            dashboard: Value::Null,
            settings: BTreeMap::new(),
        }
    }

    /// Unknown collection keys are dropped, missing ones materialize empty.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> StoreResult<Self> {
        if snapshot.version != STORE_VERSION {
            return Err(StoreError::VersionMismatch {
                found: snapshot.version,
                expected: STORE_VERSION,
            });
        }
        let mut data = Self::empty();
        for (name, records) in snapshot.collections {
            match Collection::from_name(&name) {
                Some(c) => {
                    data.collections.insert(c, records);
                }
                None => warn!(collection = %name, "dropping unknown collection from stored copy"),
            }
        }
        data.dashboard = snapshot.dashboard;
        data.settings = snapshot.settings;
        Ok(data)
    }

    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            version: STORE_VERSION,
            collections: self
                .collections
                .iter()
                .map(|(c, records)| (c.name().to_string(), records.clone()))
                .collect(),
            dashboard: self.dashboard.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl StoreSnapshot {
    pub fn parse(raw: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn collection(&self, collection: Collection) -> &[Record] {
        self.collections
            .get(collection.name())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_collections_are_dropped_and_missing_materialize() {
        let snapshot: StoreSnapshot = serde_json::from_value(json!({
            "version": STORE_VERSION,
            "collections": {
                "users": [{"id": 1}],
                "widgets": [{"id": 2}]
            }
        }))
        .unwrap();
        let data = StoreData::from_snapshot(snapshot).unwrap();
        assert_eq!(data.collections.len(), Collection::ALL.len());
        assert_eq!(data.collections[&Collection::Users].len(), 1);
        assert!(data.collections[&Collection::Tickets].is_empty());
        assert!(!data.to_snapshot().collections.contains_key("widgets"));
    }

    #[test]
    fn version_mismatch_is_reported() {
        let snapshot = StoreSnapshot {
            version: STORE_VERSION + 1,
            collections: BTreeMap::new(),
            dashboard: Value::Null,
            settings: BTreeMap::new(),
        };
        assert!(matches!(
            StoreData::from_snapshot(snapshot),
            Err(StoreError::VersionMismatch { .. })
        ));
    }
}
