//! API authentication.
//!
//! One operator credential pair from configuration; a successful login
//! yields a stateless bearer token `<payload>.<signature>` where the
//! payload is a base64url-encoded expiry/nonce pair and the signature is
//! HMAC-SHA256 over the payload with the configured secret. Verification
//! recomputes the MAC (constant-time via the hmac crate) and checks the
//! expiry; no server-side session state exists.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use dunner_domain::{AuthConfig, DunnerError, Result};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

/// An issued bearer token with its expiry
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    /// Unix expiry timestamp
    exp: i64,
    /// Random nonce so concurrent logins get distinct tokens
    nonce: String,
}

/// Credential check and token issue/verify
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Check the operator credentials and issue a token.
    pub fn login(&self, login: &str, password: &str) -> Result<IssuedToken> {
        if login != self.config.login || password != self.config.password {
            warn!(login, "rejected login attempt");
            return Err(DunnerError::Auth("invalid credentials".into()));
        }

        let expires_at = Utc::now() + chrono::Duration::seconds(self.config.token_ttl_secs);
        let mut nonce_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let payload = TokenPayload { exp: expires_at.timestamp(), nonce: hex::encode(nonce_bytes) };
        let payload_json = serde_json::to_vec(&payload)
            .map_err(|err| DunnerError::Internal(format!("token payload encoding: {err}")))?;
        let encoded = URL_SAFE_NO_PAD.encode(payload_json);
        let signature = self.sign(&encoded)?;

        info!(login, %expires_at, "operator logged in");
        Ok(IssuedToken { token: format!("{encoded}.{signature}"), expires_at })
    }

    /// Verify a bearer token: signature first, then expiry.
    pub fn verify(&self, token: &str) -> Result<()> {
        let (encoded, signature) = token
            .split_once('.')
            .ok_or_else(|| DunnerError::Auth("malformed token".into()))?;

        let mut mac = self.mac()?;
        mac.update(encoded.as_bytes());
        let signature_bytes = hex::decode(signature)
            .map_err(|_| DunnerError::Auth("malformed token signature".into()))?;
        mac.verify_slice(&signature_bytes)
            .map_err(|_| DunnerError::Auth("invalid token signature".into()))?;

        let payload_json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| DunnerError::Auth("malformed token payload".into()))?;
        let payload: TokenPayload = serde_json::from_slice(&payload_json)
            .map_err(|_| DunnerError::Auth("malformed token payload".into()))?;

        if payload.exp < Utc::now().timestamp() {
            return Err(DunnerError::Auth("token expired".into()));
        }

        Ok(())
    }

    fn sign(&self, payload: &str) -> Result<String> {
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn mac(&self) -> Result<HmacSha256> {
        HmacSha256::new_from_slice(self.config.token_secret.as_bytes())
            .map_err(|_| DunnerError::Internal("token secret unusable as hmac key".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new(AuthConfig {
            login: "admin".to_string(),
            password: "secret".to_string(),
            token_secret: "signing-secret".to_string(),
            token_ttl_secs: 3600,
        })
    }

    #[test]
    fn login_issues_a_verifiable_token() {
        let auth = service();
        let issued = auth.login("admin", "secret").expect("login succeeds");
        auth.verify(&issued.token).expect("token verifies");
    }

    #[test]
    fn wrong_credentials_are_rejected() {
        let auth = service();
        assert!(matches!(auth.login("admin", "nope"), Err(DunnerError::Auth(_))));
        assert!(matches!(auth.login("root", "secret"), Err(DunnerError::Auth(_))));
    }

    #[test]
    fn tampered_tokens_fail_verification() {
        let auth = service();
        let issued = auth.login("admin", "secret").expect("login succeeds");

        let mut tampered = issued.token.clone();
        tampered.pop();
        tampered.push('0');
        assert!(auth.verify(&tampered).is_err());

        assert!(auth.verify("garbage").is_err());
        assert!(auth.verify("a.b").is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let auth = AuthService::new(AuthConfig {
            login: "admin".to_string(),
            password: "secret".to_string(),
            token_secret: "signing-secret".to_string(),
            token_ttl_secs: -10,
        });
        let issued = auth.login("admin", "secret").expect("login succeeds");
        let err = auth.verify(&issued.token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn tokens_from_a_different_secret_fail() {
        let issued = service().login("admin", "secret").expect("login succeeds");

        let other = AuthService::new(AuthConfig {
            login: "admin".to_string(),
            password: "secret".to_string(),
            token_secret: "different-secret".to_string(),
            token_ttl_secs: 3600,
        });
        assert!(other.verify(&issued.token).is_err());
    }
}
