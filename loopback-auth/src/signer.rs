// Token signing backends.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;

use crate::error::{AuthError, AuthResult};
use crate::token::Claims;

/// Turns claims into a compact `header.payload.signature` token and back.
///
/// `decode` checks structure (and signature, where there is one) but never
/// expiry; the token service applies expiry against its own clock.
pub trait TokenSigner: Send + Sync {
    fn algorithm(&self) -> &'static str;

    fn sign(&self, claims: &Claims) -> AuthResult<String>;

    fn decode(&self, token: &str) -> AuthResult<Claims>;
}

pub(crate) fn encode_segment(value: &serde_json::Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string().as_bytes())
}

/// Split a compact token, insisting on exactly three segments.
pub(crate) fn split_token(token: &str) -> AuthResult<(&str, &str, &str)> {
    let mut parts = token.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(p), Some(s), None) => Ok((h, p, s)),
        _ => Err(AuthError::Malformed),
    }
}

pub(crate) fn decode_payload(segment: &str) -> AuthResult<Claims> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(AuthError::decode)?;
    serde_json::from_slice(&bytes).map_err(AuthError::decode)
}

/// Fixed third segment. It carries no authentication whatsoever: anyone can
/// mint a token the service will accept. Local simulation only.
pub const PLACEHOLDER_SIGNATURE: &str = "bG9vcGJhY2stdW5zaWduZWQ";

pub struct PlaceholderSigner;

impl TokenSigner for PlaceholderSigner {
    fn algorithm(&self) -> &'static str {
        "none"
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        let header = encode_segment(&json!({ "alg": self.algorithm(), "typ": "JWT" }));
        let payload = serde_json::to_value(claims).map_err(AuthError::decode)?;
        Ok(format!(
            "{header}.{}.{PLACEHOLDER_SIGNATURE}",
            encode_segment(&payload)
        ))
    }

    fn decode(&self, token: &str) -> AuthResult<Claims> {
        let (_, payload, _) = split_token(token)?;
        decode_payload(payload)
    }
}

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
pub struct JsonwebtokenSigner {
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
    issuer: String,
}

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
impl JsonwebtokenSigner {
    pub fn hs256(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
            decoding: jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.into(),
        }
    }
}

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
impl TokenSigner for JsonwebtokenSigner {
    fn algorithm(&self) -> &'static str {
        "HS256"
    }

    fn sign(&self, claims: &Claims) -> AuthResult<String> {
        use jsonwebtoken::{encode, Algorithm, Header};

        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    fn decode(&self, token: &str) -> AuthResult<Claims> {
        use jsonwebtoken::{decode, Algorithm, Validation};

        split_token(token)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.set_issuer(&[self.issuer.as_str()]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(AuthError::decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_signature_is_base64_of_a_marker() {
        let raw = URL_SAFE_NO_PAD.decode(PLACEHOLDER_SIGNATURE).unwrap();
        assert_eq!(raw, b"loopback-unsigned");
    }

    #[test]
    fn split_requires_three_segments() {
        assert!(split_token("a.b.c").is_ok());
        assert!(matches!(split_token("a.b"), Err(AuthError::Malformed)));
        assert!(matches!(split_token("a.b.c.d"), Err(AuthError::Malformed)));
        assert!(matches!(split_token(""), Err(AuthError::Malformed)));
    }

    #[test]
    fn garbage_payload_is_a_decode_error() {
        assert!(matches!(decode_payload("%%%"), Err(AuthError::Decode(_))));
        let not_claims = URL_SAFE_NO_PAD.encode(b"{\"hello\":1}");
        assert!(matches!(decode_payload(&not_claims), Err(AuthError::Decode(_))));
    }
}
