//! Firebase Authentication wire types and tokens.

use chrono::Utc;
use serde::{Deserialize, Deserializer};

/// Seconds before expiry at which an ID token is refreshed.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// ID and refresh tokens for one signed-in user.
#[derive(Clone)]
pub struct TokenSet {
    /// Short-lived bearer token for backend calls.
    pub id_token: String,
    /// Long-lived token used to mint new ID tokens.
    pub refresh_token: String,
    /// ID token lifetime in seconds.
    pub expires_in: i64,
    /// Unix timestamp when the tokens were obtained.
    pub obtained_at: i64,
}

impl TokenSet {
    /// Tokens obtained now.
    #[must_use]
    pub fn issued_now(id_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            id_token,
            refresh_token,
            expires_in,
            obtained_at: Utc::now().timestamp(),
        }
    }

    /// Check if the ID token is expired or within 60s of expiring.
    #[must_use]
    pub fn is_expiring(&self) -> bool {
        self.is_expiring_at(Utc::now().timestamp())
    }

    fn is_expiring_at(&self, now: i64) -> bool {
        now >= self.obtained_at + self.expires_in - REFRESH_MARGIN_SECS
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSet")
            .field("id_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

/// Body of `accounts:signInWithIdp`.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SignInWithIdpRequest<'a> {
    pub post_body: String,
    pub request_uri: &'a str,
    pub return_secure_token: bool,
    pub return_idp_credential: bool,
}

/// Response of `accounts:signInWithIdp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SignInWithIdpResponse {
    pub local_id: String,
    pub id_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "seconds")]
    pub expires_in: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Response of the secure token endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "seconds")]
    pub expires_in: i64,
}

/// Firebase error envelope: `{"error": {"message": "INVALID_IDP_RESPONSE"}}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub message: String,
}

/// Firebase encodes lifetimes as decimal strings.
fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(i64),
        Text(String),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_margin() {
        let tokens = TokenSet {
            id_token: "id".to_string(),
            refresh_token: "refresh".to_string(),
            expires_in: 3600,
            obtained_at: 1_000,
        };
        assert!(!tokens.is_expiring_at(1_000));
        assert!(!tokens.is_expiring_at(4_539));
        assert!(tokens.is_expiring_at(4_540));
    }

    #[test]
    fn test_seconds_accepts_string_or_number() {
        let r: RefreshResponse =
            serde_json::from_str(r#"{"id_token":"a","refresh_token":"b","expires_in":"3600"}"#)
                .unwrap();
        assert_eq!(r.expires_in, 3600);
        let r: RefreshResponse =
            serde_json::from_str(r#"{"id_token":"a","refresh_token":"b","expires_in":60}"#)
                .unwrap();
        assert_eq!(r.expires_in, 60);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let tokens = TokenSet::issued_now("eyJ-secret".to_string(), "r-secret".to_string(), 3600);
        let out = format!("{tokens:?}");
        assert!(!out.contains("secret"));
    }
}
