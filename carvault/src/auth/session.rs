//! JWT session token issuance and verification.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::Config, errors::Error as AppError, types::UserId};

/// JWT session claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId, // Subject (user ID)
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration time
}

/// Why a presented token was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or its signature is invalid")]
    Malformed,
    #[error("token has expired")]
    Expired,
}

/// Issues and verifies signed, time-bound identity tokens.
///
/// Holds the process-wide signing secret and token lifetime; both are fixed at construction.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("expiry", &self.expiry).finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, expiry: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(config.secret()?, config.auth.security.jwt_expiry))
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Create a signed token whose subject is `user_id`
    pub fn issue(&self, user_id: UserId) -> Result<String, AppError> {
        let now = Utc::now();
        let expiry = chrono::Duration::from_std(self.expiry).map_err(|e| AppError::Internal {
            operation: format!("convert JWT expiry: {e}"),
        })?;

        let claims = SessionClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + expiry).timestamp(),
        };

        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &SessionClaims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key).map_err(|e| AppError::Internal {
            operation: format!("create JWT: {e}"),
        })
    }

    /// Verify signature and expiry of a token, returning its claims.
    ///
    /// A token whose `exp` lies in the past is reported as [`TokenError::Expired`] even when its
    /// signature does not verify; such claims are only inspected, never returned.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Err(TokenError::Expired),
            Err(_) if Self::expired_unverified(token) => Err(TokenError::Expired),
            Err(_) => Err(TokenError::Malformed),
        }
    }

    /// Reads `exp` without checking the signature.
    fn expired_unverified(token: &str) -> bool {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map(|data| data.claims.exp < Utc::now().timestamp())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn service() -> TokenService {
        TokenService::new("test-secret-key-for-jwt", Duration::from_secs(3600))
    }

    fn expired_claims(user_id: UserId) -> SessionClaims {
        let now = Utc::now();
        SessionClaims {
            sub: user_id,
            iat: (now - chrono::Duration::seconds(7200)).timestamp(),
            exp: (now - chrono::Duration::seconds(3600)).timestamp(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service();
        let user_id = Uuid::new_v4();

        let token = tokens.issue(user_id).unwrap();
        assert!(!token.is_empty());

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_wrong_secret() {
        let token = service().issue(Uuid::new_v4()).unwrap();

        let other = TokenService::new("different-secret", Duration::from_secs(3600));
        assert_eq!(other.verify(&token).unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn test_verify_expired_token() {
        let tokens = service();
        let token = tokens.sign(&expired_claims(Uuid::new_v4())).unwrap();

        assert_eq!(tokens.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_expired_wins_over_bad_signature() {
        let forged = TokenService::new("attacker-secret", Duration::from_secs(3600));
        let token = forged.sign(&expired_claims(Uuid::new_v4())).unwrap();

        assert_eq!(service().verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_verify_malformed_token() {
        let tokens = service();

        for token in ["not.a.token", "invalid", "", "too.many.parts.in.this.token"] {
            assert_eq!(
                tokens.verify(token).unwrap_err(),
                TokenError::Malformed,
                "Expected Malformed for token: {token}"
            );
        }
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let tokens = service();
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let other = tokens.issue(Uuid::new_v4()).unwrap();
        parts[1] = other.split('.').nth(1).unwrap().to_string();

        assert_eq!(tokens.verify(&parts.join(".")).unwrap_err(), TokenError::Malformed);
    }
}
