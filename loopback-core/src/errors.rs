//! # Errors
//!
//! Loopback handlers fail with a small set of structured errors.
//! Core goals:
//! - consistent status codes + names
//! - can be carried through anyhow::Error (handler pipeline)
//! - rendered as the `{success:false, message}` body the client expects
//!
//! Anything that is *not* an `ApiError` is normalized into a `GeneralError`
//! (500) at the dispatcher boundary.

use std::fmt;

use anyhow::Error as AnyError;
use http::StatusCode;
use serde_json::{json, Value};

/// A convenience result type for handler code.
pub type ApiResult<T> = std::result::Result<T, AnyError>;

/// Error classes surfaced by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotAuthenticated, // 401
    Forbidden,        // 403
    NotFound,         // 404
    Conflict,         // 409
    Unprocessable,    // 422
    GeneralError,     // 500
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::GeneralError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status().as_u16()
    }

    /// Error `name` (e.g. "NotFound").
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
        }
    }
}

/// A structured error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
            source: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Convert into `anyhow::Error` so it flows through handler code.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to an `ApiError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&ApiError> {
        err.chain().find_map(|e| e.downcast_ref::<ApiError>())
    }

    /// Turn any error into an ApiError:
    /// - if it's already an ApiError, keep it
    /// - otherwise wrap as GeneralError carrying the original message
    pub fn normalize(err: AnyError) -> ApiError {
        match err.downcast::<ApiError>() {
            Ok(api) => api,
            Err(other) => {
                if let Some(inner) = ApiError::from_anyhow(&other) {
                    let mut copy = ApiError::new(inner.kind, inner.message.clone());
                    copy.errors = inner.errors.clone();
                    return copy;
                }
                ApiError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// Client-facing failure body: `{success:false, message}` plus
    /// field `errors` when present.
    pub fn to_body(&self) -> Value {
        let mut body = json!({
            "success": false,
            "message": self.message,
        });
        if let Some(e) = &self.errors {
            body["errors"] = e.clone();
        }
        body
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Convenience helper for "bail with ApiError".
#[macro_export]
macro_rules! bail_api {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::ApiError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::ApiError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn normalize_keeps_structured_errors() {
        let err = ApiError::not_found("Leave not found").into_anyhow();
        let api = ApiError::normalize(err);
        assert_eq!(api.kind, ErrorKind::NotFound);
        assert_eq!(api.code(), 404);
        assert_eq!(api.to_body(), json!({"success": false, "message": "Leave not found"}));
    }

    #[test]
    fn normalize_finds_structured_error_behind_context() {
        let err: AnyError = Err::<(), _>(ApiError::unauthorized("Unauthorized").into_anyhow())
            .context("loading identity")
            .unwrap_err();
        let api = ApiError::normalize(err);
        assert_eq!(api.kind, ErrorKind::NotAuthenticated);
        assert_eq!(api.message, "Unauthorized");
    }

    #[test]
    fn plain_errors_become_general_errors() {
        let api = ApiError::normalize(anyhow::anyhow!("boom"));
        assert_eq!(api.kind, ErrorKind::GeneralError);
        assert_eq!(api.code(), 500);
        assert_eq!(api.message, "boom");
    }

    #[test]
    fn bail_macro_returns_structured_error() {
        fn check(ok: bool) -> ApiResult<()> {
            if !ok {
                bail_api!(bad_request, "field {} is required", "email");
            }
            Ok(())
        }
        let err = check(false).unwrap_err();
        let api = ApiError::from_anyhow(&err).unwrap();
        assert_eq!(api.kind, ErrorKind::BadRequest);
        assert_eq!(api.message, "field email is required");
    }
}
