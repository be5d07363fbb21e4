//! JWT claims carried in the LMS header/payload cookie.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::Clock;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum JwtError {
    #[error("token is not in header.payload form")]
    Malformed,
    #[error("token payload is not valid base64: {0}")]
    Base64(String),
    #[error("token payload is not valid JSON: {0}")]
    Json(String),
}

/// The claims this client reads. Unknown claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub exp: i64,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub administrator: bool,
}

impl JwtClaims {
    /// Decode the payload segment of `header.payload[.signature]`.
    ///
    /// The signature is not verified: the cookie only tells the client whether it
    /// still holds a live session. Trailing `=` padding is tolerated.
    ///
    /// # Errors
    ///
    /// Returns `JwtError` when the value has no payload segment or the payload
    /// does not decode to JSON claims.
    pub fn decode(token: &str) -> Result<Self, JwtError> {
        let payload = token
            .split('.')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .ok_or(JwtError::Malformed)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| JwtError::Base64(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| JwtError::Json(e.to_string()))
    }

    /// Encode as an unsigned `header.payload` pair, the shape the LMS cookie holds.
    #[must_use]
    pub fn encode_unsigned(&self) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS512","typ":"JWT"}"#);
        let payload = serde_json::to_vec(self).unwrap_or_default();
        format!("{header}.{}", URL_SAFE_NO_PAD.encode(payload))
    }

    #[must_use]
    pub fn is_expired(&self, clock: &Clock) -> bool {
        self.exp <= clock.unix_seconds()
    }
}
