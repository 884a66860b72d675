//! Outbound request descriptors and their normalized form.

use std::collections::{BTreeMap, HashMap};

use http::{Method, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;

/// What the client hands to the adapter: `{method, url, headers, data, params}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl RequestDescriptor {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>, data: Value) -> Self {
        Self::new("POST", url).with_data(data)
    }

    pub fn put(url: impl Into<String>, data: Value) -> Self {
        Self::new("PUT", url).with_data(data)
    }

    pub fn patch(url: impl Into<String>, data: Value) -> Self {
        Self::new("PATCH", url).with_data(data)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new("DELETE", url)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {token}"))
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A request after parsing: method checked, query string split off and
/// merged with `params`, body decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl ApiRequest {
    pub fn from_descriptor(desc: RequestDescriptor) -> Result<Self, ApiError> {
        let method = Method::from_bytes(desc.method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| ApiError::bad_request(format!("Unsupported method: {}", desc.method)))?;

        let uri = parse_url(&desc.url)?;
        let path = uri.path().to_string();
        let mut query = match uri.query() {
            Some(raw) => parse_query(raw)?,
            None => HashMap::new(),
        };
        for (k, v) in desc.params {
            let v = match v {
                Value::Null => continue,
                Value::String(s) => s,
                other => other.to_string(),
            };
            query.insert(k, v);
        }

        // Some callers serialize the body themselves.
        let body = match desc.data {
            None => Value::Null,
            Some(Value::String(raw)) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
            Some(other) => other,
        };

        Ok(Self {
            method,
            path,
            query,
            headers: desc.headers,
            body,
        })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|s| s.as_str()).filter(|s| !s.is_empty())
    }

    pub fn query_usize(&self, key: &str) -> Option<usize> {
        self.query(key).and_then(|v| v.parse().ok())
    }

    pub fn body_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    /// Numeric body field; numeric strings are accepted too.
    pub fn body_i64(&self, key: &str) -> Option<i64> {
        match self.body.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Absolute URLs keep only their path; a missing leading `/` is implied.
/// Fragments are dropped by the parser.
fn parse_url(url: &str) -> Result<Uri, ApiError> {
    let url = url.trim();
    let parsed = if url.contains("://") || url.starts_with('/') {
        url.parse::<Uri>()
    } else {
        format!("/{url}").parse::<Uri>()
    };
    parsed.map_err(|e| ApiError::bad_request(format!("Invalid URL {url:?}: {e}")))
}

fn parse_query(raw: &str) -> Result<HashMap<String, String>, ApiError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw)
        .map_err(|e| ApiError::bad_request(format!("Invalid query string: {e}")))?;
    Ok(pairs.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_string_and_params_are_merged() {
        let desc = RequestDescriptor::get("/api/v1/hr/employees?status=active&search=Amina%20K")
            .with_param("page", 2)
            .with_param("department_id", Value::Null);
        let req = ApiRequest::from_descriptor(desc).unwrap();

        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/api/v1/hr/employees");
        assert_eq!(req.query("status"), Some("active"));
        assert_eq!(req.query("search"), Some("Amina K"));
        assert_eq!(req.query_usize("page"), Some(2));
        assert_eq!(req.query("department_id"), None);
    }

    #[test]
    fn fragments_never_reach_query_values() {
        let req = ApiRequest::from_descriptor(RequestDescriptor::get(
            "/api/v1/hr/employees?status=active&search=a+b#top",
        ))
        .unwrap();
        assert_eq!(req.path, "/api/v1/hr/employees");
        assert_eq!(req.query("status"), Some("active"));
        assert_eq!(req.query("search"), Some("a b"));
    }

    #[test]
    fn absolute_and_relative_urls_yield_the_path() {
        let abs = ApiRequest::from_descriptor(RequestDescriptor::get(
            "http://localhost:5000/api/v1/projects?page=2",
        ))
        .unwrap();
        assert_eq!(abs.path, "/api/v1/projects");
        assert_eq!(abs.query_usize("page"), Some(2));

        let rel = ApiRequest::from_descriptor(RequestDescriptor::get("tasks")).unwrap();
        assert_eq!(rel.path, "/tasks");
    }

    #[test]
    fn unparsable_urls_are_bad_requests() {
        let err = ApiRequest::from_descriptor(RequestDescriptor::get("/hr/employees?q=a b")).unwrap_err();
        assert_eq!(err.code(), 400);
    }

    #[test]
    fn string_bodies_are_decoded() {
        let desc = RequestDescriptor::new("post", "/auth/login")
            .with_data(Value::String(r#"{"email":"a@b.c"}"#.to_string()));
        let req = ApiRequest::from_descriptor(desc).unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.body_str("email"), Some("a@b.c"));
    }

    #[test]
    fn headers_are_case_insensitive() {
        let req = ApiRequest::from_descriptor(RequestDescriptor::get("/auth/me").bearer("t")).unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer t"));
    }

    #[test]
    fn numeric_strings_count_as_numbers() {
        let req = ApiRequest::from_descriptor(RequestDescriptor::post(
            "/hr/employees",
            json!({"department_id": "3", "salary": 10}),
        ))
        .unwrap();
        assert_eq!(req.body_i64("department_id"), Some(3));
        assert_eq!(req.body_i64("salary"), Some(10));
        assert_eq!(req.body_i64("missing"), None);
    }

    #[test]
    fn bad_methods_are_rejected() {
        let err = ApiRequest::from_descriptor(RequestDescriptor::new("G E T", "/x")).unwrap_err();
        assert_eq!(err.code(), 400);
    }
}
