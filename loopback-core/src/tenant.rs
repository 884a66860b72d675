//! Core multi-tenant types for Loopback.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A company identifier. Every tenant-aware record carries it as `company_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub i64);

impl TenantId {
    /// Read the tenant of a stored record, if it has one.
    pub fn of(record: &Value) -> Option<TenantId> {
        record.get("company_id").and_then(Value::as_i64).map(TenantId)
    }

    pub fn owns(&self, record: &Value) -> bool {
        TenantId::of(record) == Some(*self)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried with every request once the bearer token is resolved.
///
/// Handlers receive `Option<TenantContext>`: `None` means the caller is
/// anonymous and tenant-scoped reads must come back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    pub user_id: i64,
    pub email: String,
    pub role: String,
}

impl TenantContext {
    pub fn new(tenant: i64, user_id: i64, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            tenant_id: TenantId(tenant),
            user_id,
            email: email.into(),
            role: role.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn owns_matches_company_id_only() {
        let t = TenantId(101);
        assert!(t.owns(&json!({"id": 1, "company_id": 101})));
        assert!(!t.owns(&json!({"id": 1, "company_id": 202})));
        assert!(!t.owns(&json!({"id": 1})));
    }
}
