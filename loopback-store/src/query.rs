//! Helpers over raw records: ids, tenant scoping, filters and merges.

use loopback_core::TenantId;
use serde_json::Value;

use crate::Record;

/// Fields an update never overwrites.
pub const PROTECTED_FIELDS: [&str; 3] = ["id", "company_id", "created_at"];

pub fn record_id(record: &Value) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

/// `max(id) + 1`, or 1 for an empty collection.
pub fn next_id(records: &[Record]) -> i64 {
    records.iter().filter_map(record_id).max().unwrap_or(0) + 1
}

pub fn for_tenant(records: &[Record], tenant: TenantId) -> impl Iterator<Item = &Record> {
    records.iter().filter(move |r| tenant.owns(r))
}

/// Loose equality between a stored field and a query-string value.
pub fn field_equals(record: &Value, field: &str, expected: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => expected.parse::<bool>().map(|e| e == *b).unwrap_or(false),
        _ => false,
    }
}

/// Case-insensitive substring match over any of `fields`.
pub fn matches_search(record: &Value, fields: &[&str], term: &str) -> bool {
    let term = term.to_lowercase();
    fields.iter().any(|f| match record.get(*f) {
        Some(Value::String(s)) => s.to_lowercase().contains(&term),
        Some(Value::Number(n)) => n.to_string().contains(&term),
        _ => false,
    })
}

/// Copy top-level keys of `partial` onto `target`, skipping `protected`.
/// Non-object inputs leave the target untouched.
pub fn shallow_merge(target: &mut Value, partial: &Value, protected: &[&str]) {
    if let (Some(target), Some(partial)) = (target.as_object_mut(), partial.as_object()) {
        for (key, value) in partial {
            if protected.contains(&key.as_str()) {
                continue;
            }
            target.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn next_id_is_max_plus_one() {
        assert_eq!(next_id(&[]), 1);
        assert_eq!(next_id(&[json!({"id": 3}), json!({"id": 9}), json!({"id": 4})]), 10);
        assert_eq!(next_id(&[json!({"name": "no id"})]), 1);
    }

    #[test]
    fn field_equals_compares_as_strings() {
        let r = json!({"status": "open", "project_id": 4, "read": false});
        assert!(field_equals(&r, "status", "open"));
        assert!(field_equals(&r, "project_id", "4"));
        assert!(field_equals(&r, "read", "false"));
        assert!(!field_equals(&r, "project_id", "5"));
        assert!(!field_equals(&r, "missing", "x"));
    }

    #[test]
    fn merge_keeps_protected_fields() {
        let mut r = json!({"id": 1, "company_id": 101, "created_at": "t0", "name": "a"});
        shallow_merge(
            &mut r,
            &json!({"id": 99, "company_id": 202, "created_at": "t1", "name": "b", "x": [1]}),
            &PROTECTED_FIELDS,
        );
        assert_eq!(r, json!({"id": 1, "company_id": 101, "created_at": "t0", "name": "b", "x": [1]}));
    }

    #[test]
    fn search_is_case_insensitive() {
        let r = json!({"first_name": "Sarah", "email": "sarah@acme.com"});
        assert!(matches_search(&r, &["first_name", "email"], "SAR"));
        assert!(!matches_search(&r, &["first_name"], "acme"));
    }
}
