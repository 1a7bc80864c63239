//! Auth layer: HS256 bearer tokens plus the `guest-token` literal / no-token
//! guest identity.

use crate::errors::{AuthError, GatewayResult};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const ISSUER: &str = "media-gateway";
const AUDIENCE: &str = "media-gateway-clients";
const GUEST_TOKEN_LITERAL: &str = "guest-token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub roles: Vec<String>,
    pub exp: u64,
    pub iat: u64,
    pub iss: String,
    pub aud: String,
}

/// Caller identity as resolved by the `guest-ok` / `authenticated` gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Guest,
    User { subject: String, roles: Vec<String> },
}

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: u64,
}

impl AuthService {
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs,
        }
    }

    pub fn issue_token(&self, subject: &str, roles: Vec<String>) -> GatewayResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::Validation("system clock before epoch".to_string()))?
            .as_secs();

        let claims = Claims {
            sub: subject.to_string(),
            roles,
            iat: now,
            exp: now + self.expiration_secs,
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Validation(e.to_string()).into())
    }

    pub fn expiration_secs(&self) -> u64 {
        self.expiration_secs
    }

    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    /// `guest-ok` gate: a valid bearer JWT resolves to a user identity, the
    /// literal `guest-token` or a missing header both resolve to guest.
    /// `guest-token` only *identifies* the caller as a guest — it does not
    /// constitute an authorization check. This is an intentionally weak gate,
    /// not an oversight.
    pub fn resolve_guest_ok(&self, bearer: Option<&str>) -> Result<Identity, AuthError> {
        match bearer {
            None => Ok(Identity::Guest),
            Some(token) if token == GUEST_TOKEN_LITERAL => Ok(Identity::Guest),
            Some(token) => self.verify(token).map(|claims| Identity::User { subject: claims.sub, roles: claims.roles }),
        }
    }

    /// `authenticated` gate: requires a valid, non-expired bearer JWT.
    /// Missing header is a distinct error from an invalid token so the
    /// handler can map to 401 vs 403.
    pub fn resolve_authenticated(&self, bearer: Option<&str>) -> Result<Identity, AuthError> {
        let token = bearer.ok_or(AuthError::MissingToken)?;
        self.verify(token).map(|claims| Identity::User { subject: claims.sub, roles: claims.roles })
    }
}

/// Extracts the bearer token from an `Authorization` header value, if any.
pub fn extract_bearer(header_value: Option<&str>) -> Option<&str> {
    header_value?.strip_prefix("Bearer ").map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new("test-secret-value", 3600)
    }

    #[test]
    fn issues_and_verifies_roundtrip() {
        let auth = service();
        let token = auth.issue_token("alice", vec!["user".to_string()]).unwrap();
        let identity = auth.resolve_authenticated(Some(&token)).unwrap();
        assert_eq!(identity, Identity::User { subject: "alice".to_string(), roles: vec!["user".to_string()] });
    }

    #[test]
    fn missing_token_on_authenticated_gate_is_missing_token_error() {
        let auth = service();
        let err = auth.resolve_authenticated(None).unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[test]
    fn guest_token_literal_resolves_to_guest_on_guest_ok_gate() {
        let auth = service();
        let identity = auth.resolve_guest_ok(Some("guest-token")).unwrap();
        assert_eq!(identity, Identity::Guest);
    }

    #[test]
    fn no_token_resolves_to_guest_on_guest_ok_gate() {
        let auth = service();
        let identity = auth.resolve_guest_ok(None).unwrap();
        assert_eq!(identity, Identity::Guest);
    }

    #[test]
    fn invalid_token_on_guest_ok_gate_is_an_error_not_silently_guest() {
        let auth = service();
        let err = auth.resolve_guest_ok(Some("not-a-jwt")).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn extract_bearer_strips_prefix() {
        assert_eq!(extract_bearer(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer(Some("Basic xyz")), None);
        assert_eq!(extract_bearer(None), None);
    }
}
