use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Why a token or credential operation failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token must have exactly three segments")]
    Malformed,

    #[error("token payload could not be decoded: {0}")]
    Decode(String),

    #[error("token expired at {exp}")]
    Expired { exp: i64 },

    #[error("expected a {expected} token")]
    WrongKind { expected: &'static str },

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("invalid token options: {0}")]
    Options(String),

    #[error("password hashing failed: {source}")]
    Password {
        #[from]
        source: bcrypt::BcryptError,
    },
}

impl AuthError {
    pub fn decode<E: std::fmt::Display>(err: E) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn options<S: Into<String>>(reason: S) -> Self {
        Self::Options(reason.into())
    }
}
