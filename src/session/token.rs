//! Reading (and, for the local backend, minting) JWT-shaped session tokens.
//!
//! Claims are decoded without any signature verification. The result is only
//! used to decide whether the UI should treat the session as live.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Expiry as seconds since the Unix epoch.
    pub exp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<f64>,
}

impl TokenClaims {
    /// Expiry scaled to milliseconds, the unit the clock is compared in.
    pub fn expires_at_millis(&self) -> i64 {
        (self.exp * 1000.0) as i64
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.expires_at_millis())
    }

    /// True while `now` is strictly before the expiry instant. An expiry
    /// outside the representable date range is never live.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expiry| now < expiry)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TokenError {
    #[error("token has no payload segment")]
    MissingPayload,
    #[error("payload is not base64: {0}")]
    Encoding(String),
    #[error("payload claims are not valid: {0}")]
    Claims(String),
}

/// Decodes the payload segment of `token`.
pub fn decode_claims(token: &str) -> Result<TokenClaims, TokenError> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or(TokenError::MissingPayload)?;
    let payload = payload.trim_end_matches('=');

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .map_err(|e| TokenError::Encoding(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TokenError::Claims(e.to_string()))
}

/// Whether `token` decodes and has not expired at `now`. Never fails.
pub fn is_live(token: &str, now: DateTime<Utc>) -> bool {
    decode_claims(token).is_ok_and(|claims| claims.is_live_at(now))
}

/// Builds an unsigned token carrying `claims`.
pub fn encode_unsigned(claims: &TokenClaims) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    // Serializing a struct of strings and floats cannot fail.
    let payload = serde_json::to_vec(claims).unwrap_or_default();
    format!("{header}.{}.", URL_SAFE_NO_PAD.encode(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn token_expiring(exp: f64) -> String {
        encode_unsigned(&TokenClaims { sub: Some("admin".into()), exp, iat: None })
    }

    #[test]
    fn live_until_expiry() {
        let token = token_expiring(1_700_000_000.0);
        assert!(is_live(&token, at(1_699_999_999)));
        assert!(!is_live(&token, at(1_700_000_000)));
        assert!(!is_live(&token, at(1_700_000_001)));
    }

    #[test]
    fn malformed_tokens_are_never_live() {
        let now = at(0);
        for token in ["", "abc", "a..c", "a.!!!.c", "a.bm90IGpzb24.c"] {
            assert!(!is_live(token, now), "token {token:?} should not be live");
        }
    }

    #[test]
    fn missing_exp_claim_is_rejected() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"admin"}"#);
        let token = format!("h.{payload}.s");
        assert!(matches!(decode_claims(&token), Err(TokenError::Claims(_))));
        assert!(!is_live(&token, at(0)));
    }

    #[test]
    fn accepts_padded_standard_alphabet() {
        let payload = base64::engine::general_purpose::STANDARD.encode(br#"{"exp":4102444800}"#);
        let token = format!("h.{payload}.s");
        let claims = decode_claims(&token).unwrap();
        assert_eq!(claims.expires_at(), Some(at(4_102_444_800)));
    }

    #[test]
    fn out_of_range_expiry_is_not_live() {
        let claims = TokenClaims { sub: None, exp: 1e300, iat: None };
        assert_eq!(claims.expires_at(), None);
        assert!(!claims.is_live_at(at(0)));
        assert!(!is_live(&token_expiring(1e300), at(0)));
    }
}
