// Token options and configuration.

use std::time::Duration;

use loopback_core::{ConfigError, ConfigSnapshot};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

const MIN_PASSWORD_COST: u32 = 4;
const MAX_PASSWORD_COST: u32 = 31;

/// How the third token segment is produced.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SigningMode {
    /// Constant placeholder segment; authenticates nothing.
    #[default]
    Placeholder,
    /// HMAC using SHA-256 (requires a jsonwebtoken backend feature and a secret).
    Hs256,
}

impl std::str::FromStr for SigningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "placeholder" | "none" => Ok(Self::Placeholder),
            "hs256" => Ok(Self::Hs256),
            other => Err(format!("unknown signing mode `{other}`")),
        }
    }
}

/// Token service configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenOptions {
    /// Token issuer (iss claim)
    pub issuer: String,
    /// Access token lifetime
    #[serde(with = "humantime_serde")]
    pub access_token_expires_in: Duration,
    /// Refresh token lifetime
    #[serde(with = "humantime_serde")]
    pub refresh_token_expires_in: Duration,
    pub signing: SigningMode,
    /// HMAC secret, used by `SigningMode::Hs256`
    pub secret: Option<String>,
    /// bcrypt cost for newly stored passwords
    pub password_cost: u32,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            issuer: "loopback".to_string(),
            access_token_expires_in: Duration::from_secs(86_400), // 1 day
            refresh_token_expires_in: Duration::from_secs(604_800), // 7 days
            signing: SigningMode::Placeholder,
            secret: None,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl TokenOptions {
    /// Read `auth.*` keys from a config snapshot on top of the defaults.
    pub fn from_config(cfg: &ConfigSnapshot) -> Result<Self, ConfigError> {
        let mut out = Self::default();
        if let Some(issuer) = cfg.get_string("auth.issuer") {
            out.issuer = issuer;
        }
        if let Some(ttl) = cfg.get_duration("auth.access_ttl")? {
            out.access_token_expires_in = ttl;
        }
        if let Some(ttl) = cfg.get_duration("auth.refresh_ttl")? {
            out.refresh_token_expires_in = ttl;
        }
        if let Some(mode) = cfg.get("auth.signing") {
            out.signing = mode
                .parse()
                .map_err(|reason: String| ConfigError::invalid("auth.signing", reason))?;
        }
        if let Some(secret) = cfg.get_string("auth.secret") {
            out.secret = Some(secret);
        }
        if let Some(cost) = cfg.get_u32("auth.password_cost")? {
            out.password_cost = cost;
        }
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.issuer.is_empty() {
            return Err(AuthError::options("issuer cannot be empty"));
        }
        if self.access_token_expires_in.as_secs() == 0 {
            return Err(AuthError::options("access token lifetime must be greater than 0"));
        }
        if self.refresh_token_expires_in.as_secs() == 0 {
            return Err(AuthError::options("refresh token lifetime must be greater than 0"));
        }
        if self.signing == SigningMode::Hs256 && self.secret.as_deref().unwrap_or("").is_empty() {
            return Err(AuthError::options("HS256 signing requires a secret"));
        }
        if !(MIN_PASSWORD_COST..=MAX_PASSWORD_COST).contains(&self.password_cost) {
            return Err(AuthError::options(format!(
                "password cost must be within {MIN_PASSWORD_COST}..={MAX_PASSWORD_COST}"
            )));
        }
        Ok(())
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_token_expires_in = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_token_expires_in = ttl;
        self
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn hs256(mut self, secret: impl Into<String>) -> Self {
        self.signing = SigningMode::Hs256;
        self.secret = Some(secret.into());
        self
    }
}
