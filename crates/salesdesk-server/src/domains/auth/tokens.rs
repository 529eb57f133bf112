//! HS256 bearer tokens carrying the caller's id and role.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use salesdesk_core::{Identity, UserRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuthConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: UserRole,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token_encode_failed")]
    Encode,
    #[error("token_expired")]
    Expired,
    #[error("token_invalid")]
    Invalid,
}

impl TokenError {
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::Encode => "encode_failed",
            Self::Expired => "expired",
            Self::Invalid => "invalid",
        }
    }
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: Option<String>,
    ttl_seconds: i64,
    leeway_seconds: u64,
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &[u8], auth: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: auth.issuer.clone(),
            audience: auth
                .audience
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            ttl_seconds: auth.token_ttl_seconds,
            leeway_seconds: auth.leeway_seconds,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_with_ttl(identity, self.ttl_seconds)
    }

    pub fn issue_with_ttl(
        &self,
        identity: &Identity,
        ttl_seconds: i64,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.user_id,
            role: identity.role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + ttl_seconds,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|err| {
            tracing::error!(event = "token_encode_failed", error = %err);
            TokenError::Encode
        })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_seconds;
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        match self.audience.as_deref() {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        Ok(Identity::new(data.claims.sub, data.claims.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn keys(auth: &AuthConfig) -> TokenKeys {
        TokenKeys::new(SECRET, auth)
    }

    #[test]
    fn issued_token_verifies_to_same_identity() {
        let keys = keys(&AuthConfig::default());
        let identity = Identity::new(Uuid::now_v7(), UserRole::Manager);
        let token = keys.issue(&identity).expect("issue");
        assert_eq!(keys.verify(&token), Ok(identity));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = AuthConfig {
            leeway_seconds: 0,
            ..AuthConfig::default()
        };
        let keys = keys(&auth);
        let identity = Identity::new(Uuid::now_v7(), UserRole::Sales);
        let token = keys.issue_with_ttl(&identity, -120).expect("issue");
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let identity = Identity::new(Uuid::now_v7(), UserRole::Admin);
        let other = keys(&AuthConfig {
            issuer: "someone-else".to_string(),
            ..AuthConfig::default()
        });
        let token = other.issue(&identity).expect("issue");
        assert_eq!(
            keys(&AuthConfig::default()).verify(&token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let identity = Identity::new(Uuid::now_v7(), UserRole::Admin);
        let other = TokenKeys::new(b"another-secret-another-secret-xx", &AuthConfig::default());
        let token = other.issue(&identity).expect("issue");
        assert_eq!(
            keys(&AuthConfig::default()).verify(&token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn audience_is_enforced_when_configured() {
        let with_aud = keys(&AuthConfig {
            audience: Some("salesdesk-api".to_string()),
            ..AuthConfig::default()
        });
        let identity = Identity::new(Uuid::now_v7(), UserRole::Sales);
        let token = with_aud.issue(&identity).expect("issue");
        assert_eq!(with_aud.verify(&token), Ok(identity.clone()));

        let without_aud = keys(&AuthConfig::default());
        let token = without_aud.issue(&identity).expect("issue");
        assert_eq!(with_aud.verify(&token), Err(TokenError::Invalid));
    }
}
