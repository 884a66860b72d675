//! Response envelopes.
//!
//! Handler bodies follow two shapes:
//! - success: `{ "success": true, "data": <payload> }`
//! - failure: `{ "success": false, "message": <string> }`
//!
//! The adapter wraps a body in a [`ResponseEnvelope`] (`status`, `statusText`,
//! `headers`, `data`) or, for `status >= 400`, a [`Rejection`].

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Body constructors shared by all handlers.
pub struct Body;

impl Body {
    pub fn success(data: Value) -> Value {
        json!({ "success": true, "data": data })
    }

    pub fn message(message: impl Into<String>, data: Value) -> Value {
        json!({ "success": true, "message": message.into(), "data": data })
    }

    pub fn failure(message: impl Into<String>) -> Value {
        json!({ "success": false, "message": message.into() })
    }

    /// `{ <key>: [...], pagination?: {...} }`
    pub fn list(key: &str, items: Vec<Value>, pagination: Option<Pagination>) -> Value {
        let mut payload = Map::new();
        payload.insert(key.to_string(), Value::Array(items));
        if let Some(p) = pagination {
            payload.insert("pagination".to_string(), json!(p));
        }
        Value::Object(payload)
    }

    /// The body returned for routes nobody registered.
    pub fn fallback() -> Value {
        json!({ "success": true, "data": null })
    }
}

/// Page metadata for paginated list payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

impl Pagination {
    /// `page` is 1-based; a zero page or limit is clamped to 1.
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        }
    }

    /// Cut the current page out of an already filtered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let start = (self.page - 1).saturating_mul(self.limit);
        items.into_iter().skip(start).take(self.limit).collect()
    }
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}

/// What a successful simulated call resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn new(status: StatusCode, data: Value) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status: status.as_u16(),
            status_text: status_text(status),
            headers,
            data,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// `data.data` of a success body.
    pub fn payload(&self) -> &Value {
        self.data.get("data").unwrap_or(&Value::Null)
    }

    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(Value::as_str)
    }

    pub fn into_rejection(self) -> Rejection {
        Rejection {
            response: RejectedResponse {
                status: self.status,
                status_text: self.status_text,
                data: self.data,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedResponse {
    pub status: u16,
    pub status_text: String,
    pub data: Value,
}

/// A rejected simulated call: `{ response: { status, statusText, data } }`.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("Request failed with status code {}", .response.status)]
pub struct Rejection {
    pub response: RejectedResponse,
}

impl Rejection {
    pub fn status(&self) -> u16 {
        self.response.status
    }

    /// `data.message`, which the UI shows in its toast.
    pub fn message(&self) -> Option<&str> {
        self.response.data.get("message").and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_counts_pages_and_slices() {
        let p = Pagination::new(2, 3, 7);
        assert_eq!(p.pages, 3);
        assert_eq!(p.slice((1..=7).collect::<Vec<_>>()), vec![4, 5, 6]);

        let last = Pagination::new(3, 3, 7);
        assert_eq!(last.slice((1..=7).collect::<Vec<_>>()), vec![7]);

        let empty = Pagination::new(0, 0, 0);
        assert_eq!((empty.page, empty.limit, empty.pages), (1, 1, 0));
    }

    #[test]
    fn envelopes_carry_reason_phrases() {
        let env = ResponseEnvelope::new(StatusCode::CREATED, Body::success(json!({"id": 1})));
        assert_eq!(env.status_text, "Created");
        assert_eq!(env.payload()["id"], 1);
        assert!(!env.is_error());

        let rej = ResponseEnvelope::new(StatusCode::UNAUTHORIZED, Body::failure("User not found"))
            .into_rejection();
        assert_eq!(rej.status(), 401);
        assert_eq!(rej.message(), Some("User not found"));
        assert_eq!(rej.to_string(), "Request failed with status code 401");
    }

    #[test]
    fn list_payload_includes_pagination_only_when_given() {
        let plain = Body::list("employees", vec![json!({"id": 1})], None);
        assert!(plain.get("pagination").is_none());

        let paged = Body::list("employees", vec![], Some(Pagination::new(1, 10, 0)));
        assert_eq!(paged["pagination"]["limit"], 10);
    }
}
