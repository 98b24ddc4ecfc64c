//! Per-request script nonce.
//!
//! Pages put the nonce on their `<script>` tags; the security headers
//! layer allows it in `script-src`.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

const NONCE_BYTES: usize = 16;

/// Base64 script nonce for one page.
#[derive(Clone, Debug)]
pub struct CspNonce(pub(crate) String);

impl CspNonce {
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Attach a fresh nonce to the request, and to the response for the
/// headers layer.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    let nonce = CspNonce::generate();
    request.extensions_mut().insert(nonce.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(nonce);
    response
}

impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(nonce) = parts.extensions.get::<Self>() {
            return Ok(nonce.clone());
        }
        // Scripts stay blocked without a nonce; the page still renders.
        tracing::warn!(path = %parts.uri.path(), "Page rendered without a script nonce");
        Ok(Self(String::new()))
    }
}
