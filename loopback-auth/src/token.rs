// Session token issuance and verification.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::options::{SigningMode, TokenOptions};
use crate::signer::{PlaceholderSigner, TokenSigner};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Token payload. Access tokens carry no `kind`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub tenant: i64,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TokenKind>,
}

impl Claims {
    pub fn is_refresh(&self) -> bool {
        self.kind == Some(TokenKind::Refresh)
    }
}

/// The user a token pair is issued for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSubject {
    pub id: i64,
    pub email: String,
    pub company_id: i64,
    pub role: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    options: TokenOptions,
    signer: Arc<dyn TokenSigner>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.options.issuer)
            .field("algorithm", &self.signer.algorithm())
            .finish()
    }
}

impl TokenService {
    pub fn new(options: TokenOptions) -> AuthResult<Self> {
        options.validate()?;
        let signer: Arc<dyn TokenSigner> = match options.signing {
            SigningMode::Placeholder => Arc::new(PlaceholderSigner),
            SigningMode::Hs256 => hs256_signer(&options)?,
        };
        Ok(Self { options, signer })
    }

    /// Use a custom signer instead of the one named by the options.
    pub fn with_signer(options: TokenOptions, signer: Arc<dyn TokenSigner>) -> AuthResult<Self> {
        options.validate()?;
        Ok(Self { options, signer })
    }

    pub fn options(&self) -> &TokenOptions {
        &self.options
    }

    pub fn algorithm(&self) -> &'static str {
        self.signer.algorithm()
    }

    pub fn issue(&self, subject: &TokenSubject) -> AuthResult<TokenPair> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Issue an access/refresh pair as of `now` (unix seconds).
    pub fn issue_at(&self, subject: &TokenSubject, now: i64) -> AuthResult<TokenPair> {
        let access = self.claims(subject, now, TokenKind::Access);
        let refresh = self.claims(subject, now, TokenKind::Refresh);
        debug!(sub = subject.id, tenant = subject.company_id, "issuing token pair");
        Ok(TokenPair {
            access_token: self.signer.sign(&access)?,
            refresh_token: self.signer.sign(&refresh)?,
        })
    }

    pub fn verify(&self, token: &str) -> Option<Claims> {
        self.verify_at(token, Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Option<Claims> {
        match self.check_at(token, now) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!(error = %e, "token rejected");
                None
            }
        }
    }

    /// Like `verify`, but also requires a refresh token.
    pub fn verify_refresh(&self, token: &str) -> AuthResult<Claims> {
        self.verify_refresh_at(token, Utc::now().timestamp())
    }

    pub fn verify_refresh_at(&self, token: &str, now: i64) -> AuthResult<Claims> {
        let claims = self.check_at(token, now)?;
        if !claims.is_refresh() {
            return Err(AuthError::WrongKind {
                expected: TokenKind::Refresh.as_str(),
            });
        }
        Ok(claims)
    }

    /// Decode and check expiry, reporting why a token was refused.
    pub fn check_at(&self, token: &str, now: i64) -> AuthResult<Claims> {
        let claims = self.decode(token)?;
        if claims.exp < now {
            return Err(AuthError::Expired { exp: claims.exp });
        }
        Ok(claims)
    }

    /// Decode without checking expiry.
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        self.signer.decode(token)
    }

    fn claims(&self, subject: &TokenSubject, now: i64, kind: TokenKind) -> Claims {
        let (ttl, kind) = match kind {
            TokenKind::Access => (self.options.access_token_expires_in, None),
            TokenKind::Refresh => (self.options.refresh_token_expires_in, Some(TokenKind::Refresh)),
        };
        Claims {
            sub: subject.id,
            email: subject.email.clone(),
            tenant: subject.company_id,
            role: subject.role.clone(),
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
            iss: self.options.issuer.clone(),
            kind,
        }
    }
}

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
fn hs256_signer(options: &TokenOptions) -> AuthResult<Arc<dyn TokenSigner>> {
    let secret = options
        .secret
        .as_deref()
        .ok_or_else(|| AuthError::options("HS256 signing requires a secret"))?;
    Ok(Arc::new(crate::signer::JsonwebtokenSigner::hs256(
        secret,
        options.issuer.clone(),
    )))
}

#[cfg(not(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto")))]
fn hs256_signer(_options: &TokenOptions) -> AuthResult<Arc<dyn TokenSigner>> {
    Err(AuthError::options(
        "HS256 signing requires loopback-auth to be built with `jwt-aws-lc-rs` or `jwt-rust-crypto`",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> TokenSubject {
        TokenSubject {
            id: 1,
            email: "admin@acme.com".into(),
            company_id: 101,
            role: "admin".into(),
        }
    }

    #[test]
    fn access_claims_omit_kind() {
        let svc = TokenService::new(TokenOptions::default()).unwrap();
        let pair = svc.issue_at(&subject(), 1_000).unwrap();
        let access = svc.decode(&pair.access_token).unwrap();
        assert_eq!(access.kind, None);
        assert_eq!(access.exp, 1_000 + 86_400);

        let refresh = svc.decode(&pair.refresh_token).unwrap();
        assert_eq!(refresh.kind, Some(TokenKind::Refresh));
        assert_eq!(refresh.exp, 1_000 + 7 * 86_400);
    }

    #[test]
    fn oversized_lifetimes_saturate_instead_of_expiring() {
        let options = TokenOptions::default().with_access_ttl(std::time::Duration::from_secs(u64::MAX));
        let svc = TokenService::new(options).unwrap();
        let pair = svc.issue_at(&subject(), 1_000).unwrap();
        let claims = svc.verify_at(&pair.access_token, 1_000).unwrap();
        assert_eq!(claims.exp, i64::MAX);
    }

    #[test]
    fn token_pair_serializes_camel_case() {
        let pair = TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        };
        let v = serde_json::to_value(&pair).unwrap();
        assert_eq!(v["accessToken"], "a");
        assert_eq!(v["refreshToken"], "r");
    }

    #[cfg(not(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto")))]
    #[test]
    fn hs256_without_backend_is_an_options_error() {
        let err = TokenService::new(TokenOptions::default().hs256("secret")).unwrap_err();
        assert!(matches!(err, AuthError::Options(_)));
    }
}
