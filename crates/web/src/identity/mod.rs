//! Firebase Authentication client.
//!
//! The browser signs in with Google Identity Services and posts the Google
//! credential to the site. The credential is exchanged here for Firebase
//! tokens; the resulting [`SignedInUser`] hands out bearer tokens for the
//! backend, refreshing them when they are about to expire.
//!
//! # Flow
//!
//! 1. Google posts `credential` to `/auth/google`
//! 2. [`FirebaseIdentity::sign_in_with_google`] calls `accounts:signInWithIdp`
//! 3. The session publishes the user on its auth-state channel
//! 4. Backend calls use [`SignedInUser::id_token`]

mod types;

pub use types::{REFRESH_MARGIN_SECS, TokenSet};

use std::sync::Arc;

use herbal_garden_core::{Email, UserId};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use crate::config::FirebaseConfig;
use types::{ErrorEnvelope, RefreshResponse, SignInWithIdpRequest, SignInWithIdpResponse};

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider refused the credential or refresh token.
    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The sign-in popup was closed without a credential.
    #[error("Sign-in was cancelled")]
    Cancelled,

    /// The Google CSRF double-submit token did not match.
    #[error("Sign-in request failed CSRF verification")]
    CsrfMismatch,
}

// =============================================================================
// FirebaseIdentity
// =============================================================================

/// Client for the Firebase Authentication REST API.
#[derive(Clone)]
pub struct FirebaseIdentity {
    inner: Arc<FirebaseIdentityInner>,
}

struct FirebaseIdentityInner {
    client: reqwest::Client,
    api_key: SecretString,
    google_client_id: String,
    sign_in_url: Url,
    token_url: Url,
    request_uri: String,
}

impl FirebaseIdentity {
    /// Create a new identity client.
    ///
    /// `request_uri` is the site's public URL, reported to Firebase as the
    /// origin of the sign-in.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the configured
    /// endpoints cannot be joined.
    pub fn new(config: &FirebaseConfig, request_uri: &str) -> Result<Self, IdentityError> {
        let sign_in_url = config
            .auth_url
            .join("v1/accounts:signInWithIdp")
            .map_err(|e| IdentityError::Parse(e.to_string()))?;
        let token_url = config
            .token_url
            .join("v1/token")
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(FirebaseIdentityInner {
                client: reqwest::Client::builder().build()?,
                api_key: config.api_key.clone(),
                google_client_id: config.google_client_id.clone(),
                sign_in_url,
                token_url,
                request_uri: request_uri.to_string(),
            }),
        })
    }

    /// OAuth client ID rendered into the Google sign-in button.
    #[must_use]
    pub fn google_client_id(&self) -> &str {
        &self.inner.google_client_id
    }

    fn keyed(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("key", self.inner.api_key.expose_secret());
        url
    }

    /// Exchange a Google ID token credential for a Firebase session.
    ///
    /// # Errors
    ///
    /// `IdentityError::Cancelled` for an empty credential,
    /// `IdentityError::Rejected` when Firebase refuses it.
    #[instrument(skip(self, credential))]
    pub async fn sign_in_with_google(&self, credential: &str) -> Result<SignedInUser, IdentityError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(IdentityError::Cancelled);
        }

        let body = SignInWithIdpRequest {
            post_body: format!(
                "id_token={}&providerId=google.com",
                urlencoding::encode(credential)
            ),
            request_uri: &self.inner.request_uri,
            return_secure_token: true,
            return_idp_credential: false,
        };

        let response = self
            .inner
            .client
            .post(self.keyed(&self.inner.sign_in_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected(provider_message(&text)));
        }

        let signed_in: SignInWithIdpResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        tracing::info!(user = %signed_in.local_id, "Signed in with Google");

        let profile = UserProfile {
            uid: UserId::new(signed_in.local_id),
            display_name: signed_in.display_name.filter(|n| !n.trim().is_empty()),
            email: signed_in.email.as_deref().and_then(|e| Email::parse(e).ok()),
            first_name: signed_in.first_name,
            last_name: signed_in.last_name,
        };
        let tokens = TokenSet::issued_now(
            signed_in.id_token,
            signed_in.refresh_token,
            signed_in.expires_in,
        );

        Ok(SignedInUser::new(self.clone(), profile, tokens))
    }

    /// Mint a new ID token from a refresh token.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Firebase rejects the token.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, IdentityError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .inner
            .client
            .post(self.keyed(&self.inner.token_url))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdentityError::Rejected(provider_message(&text)));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        Ok(TokenSet::issued_now(
            refreshed.id_token,
            refreshed.refresh_token,
            refreshed.expires_in,
        ))
    }
}

/// Pull Firebase's error code out of an error body.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

// =============================================================================
// SignedInUser
// =============================================================================

/// Profile fields reported by the provider at sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// The user signed in to one browser session.
///
/// Cheap to clone; clones share the token set.
#[derive(Clone)]
pub struct SignedInUser {
    inner: Arc<SignedInUserInner>,
}

struct SignedInUserInner {
    profile: UserProfile,
    tokens: Mutex<TokenSet>,
    identity: FirebaseIdentity,
}

impl SignedInUser {
    /// Wrap a profile and its tokens.
    #[must_use]
    pub fn new(identity: FirebaseIdentity, profile: UserProfile, tokens: TokenSet) -> Self {
        Self {
            inner: Arc::new(SignedInUserInner {
                profile,
                tokens: Mutex::new(tokens),
                identity,
            }),
        }
    }

    #[must_use]
    pub fn uid(&self) -> &UserId {
        &self.inner.profile.uid
    }

    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.inner.profile
    }

    #[must_use]
    pub fn email(&self) -> Option<&Email> {
        self.inner.profile.email.as_ref()
    }

    /// Name for the navigation bar: display name, then email, then uid.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        let profile = &self.inner.profile;
        profile
            .display_name
            .as_deref()
            .or_else(|| profile.email.as_ref().map(Email::as_str))
            .unwrap_or_else(|| profile.uid.as_str())
    }

    /// A bearer token for backend calls.
    ///
    /// Refreshes through the provider when the current token is within
    /// 60 seconds of expiry. Concurrent callers wait for one refresh.
    ///
    /// # Errors
    ///
    /// Returns error if a needed refresh fails.
    pub async fn id_token(&self) -> Result<String, IdentityError> {
        let mut tokens = self.inner.tokens.lock().await;
        if tokens.is_expiring() {
            tracing::debug!(user = %self.uid(), "Refreshing ID token");
            *tokens = self.inner.identity.refresh(&tokens.refresh_token).await?;
        }
        Ok(tokens.id_token.clone())
    }
}

impl std::fmt::Debug for SignedInUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedInUser")
            .field("profile", &self.inner.profile)
            .finish_non_exhaustive()
    }
}
