use chrono::{DateTime, SecondsFormat, Utc};
use http::StatusCode;
use loopback_auth::TokenService;
use loopback_core::{ApiError, ApiRequest, Body, Pagination, TenantContext, TenantId};
use loopback_store::{Collection, Repository};
use serde_json::Value;

use crate::config::SimConfig;

/// Everything a handler may touch for one request.
pub struct HandlerCtx<'a> {
    pub request: &'a ApiRequest,
    /// Resolved from the bearer token; `None` for anonymous callers.
    pub identity: Option<TenantContext>,
    pub repo: &'a mut Repository,
    pub tokens: &'a TokenService,
    pub config: &'a SimConfig,
    pub now: DateTime<Utc>,
}

impl<'a> HandlerCtx<'a> {
    pub fn tenant(&self) -> Option<TenantId> {
        self.identity.as_ref().map(|id| id.tenant_id)
    }

    pub fn require_identity(&self) -> anyhow::Result<TenantContext> {
        self.identity
            .clone()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized").into_anyhow())
    }

    /// Checks the role stored on the user record, so a demotion takes effect
    /// before the caller's token expires.
    pub fn require_admin(&self) -> anyhow::Result<TenantContext> {
        let identity = self.require_identity()?;
        let role = self
            .repo
            .find_for(Collection::Users, identity.tenant_id, identity.user_id)
            .and_then(|user| user.get("role"))
            .and_then(Value::as_str);
        if role != Some("admin") {
            return Err(ApiError::forbidden("Insufficient permissions").into_anyhow());
        }
        Ok(identity)
    }

    /// RFC 3339 timestamp for `created_at` and friends.
    pub fn timestamp(&self) -> String {
        self.now.to_rfc3339_opts(SecondsFormat::Millis, false)
    }

    pub fn today(&self) -> String {
        self.now.format("%Y-%m-%d").to_string()
    }

    /// Page metadata, only when the caller asked for `page` or `limit`.
    pub fn pagination(&self, total: usize) -> Option<Pagination> {
        let page = self.request.query_usize("page");
        let limit = self.request.query_usize("limit");
        if page.is_none() && limit.is_none() {
            return None;
        }
        let limit = limit
            .unwrap_or(self.config.paginate_default)
            .min(self.config.paginate_max);
        Some(Pagination::new(page.unwrap_or(1), limit, total))
    }

    /// The request body as an object, or 400.
    pub fn body_object(&self) -> anyhow::Result<&serde_json::Map<String, Value>> {
        self.request
            .body
            .as_object()
            .ok_or_else(|| ApiError::bad_request("Request body must be a JSON object").into_anyhow())
    }

    /// A non-empty string field of the body, or 400 `"<field> is required"`.
    pub fn required_str(&self, field: &str) -> anyhow::Result<String> {
        match self.request.body_str(field).map(str::trim) {
            Some(s) if !s.is_empty() => Ok(s.to_string()),
            _ => Err(ApiError::bad_request(format!("{field} is required")).into_anyhow()),
        }
    }
}

/// What a handler returns; the dispatcher wraps it in an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self { status, body }
    }

    /// `200 {success:true, data}`
    pub fn ok(data: Value) -> Self {
        Self::new(StatusCode::OK, Body::success(data))
    }

    /// `201 {success:true, data}`
    pub fn created(data: Value) -> Self {
        Self::new(StatusCode::CREATED, Body::success(data))
    }

    pub fn message(message: impl Into<String>, data: Value) -> Self {
        Self::new(StatusCode::OK, Body::message(message, data))
    }

    pub fn list(key: &str, items: Vec<Value>, pagination: Option<Pagination>) -> Self {
        Self::ok(Body::list(key, items, pagination))
    }
}

/// `404 "<label> not found"` as an error for `?`.
pub fn not_found(label: &str) -> anyhow::Error {
    ApiError::not_found(format!("{label} not found")).into_anyhow()
}
