//! Bearer tokens.
//!
//! A token is `<claims>.<signature>`: the claims are JSON, the signature is an
//! HMAC-SHA256 of the encoded claims, both base64url without padding.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use crate::{EngineError, ResultEngine, users::Identity};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct Claims {
    id: i32,
    email: String,
    exp: i64,
}

#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn invalid_token() -> EngineError {
    EngineError::Unauthorized("invalid token".to_string())
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> ResultEngine<Self> {
        if secret.is_empty() {
            return Err(EngineError::InvalidInput(
                "token secret must not be empty".to_string(),
            ));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|err| EngineError::InvalidInput(err.to_string()))?;
        Ok(Self { mac, ttl })
    }

    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> String {
        let claims = json!({
            "id": identity.user_id,
            "email": identity.email,
            "iat": now.timestamp(),
            "exp": (now + self.ttl).timestamp(),
        });
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{payload}.{signature}")
    }

    /// Any malformed, tampered or expired token is [`EngineError::Unauthorized`].
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> ResultEngine<Identity> {
        let (payload, signature) = token.split_once('.').ok_or_else(invalid_token)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| invalid_token())?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid_token())?;

        let claims = URL_SAFE_NO_PAD.decode(payload).map_err(|_| invalid_token())?;
        let claims: Claims = serde_json::from_slice(&claims).map_err(|_| invalid_token())?;
        if claims.exp <= now.timestamp() {
            return Err(EngineError::Unauthorized("token expired".to_string()));
        }

        Ok(Identity {
            user_id: claims.id,
            email: claims.email,
        })
    }
}
