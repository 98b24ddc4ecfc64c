//! Security headers middleware.
//!
//! Locked down by default and loosened only for Google Identity Services
//! (sign-in button script, iframe and popup) and remote plant images.

use axum::{
    extract::Request,
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;

/// Google Identity Services origin.
const GSI_ORIGIN: &str = "https://accounts.google.com";

/// Build the CSP for a response, allowing scripts carrying `nonce`.
#[must_use]
pub fn content_security_policy(nonce: Option<&str>) -> String {
    let script_nonce = nonce
        .filter(|n| !n.is_empty())
        .map(|n| format!(" 'nonce-{n}'"))
        .unwrap_or_default();

    format!(
        "default-src 'none'; \
         script-src 'self'{script_nonce} {GSI_ORIGIN}/gsi/client; \
         style-src 'self' {GSI_ORIGIN}/gsi/style; \
         font-src 'self'; \
         img-src 'self' https: data:; \
         connect-src 'self' {GSI_ORIGIN}/gsi/; \
         frame-src {GSI_ORIGIN}/gsi/; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin` (GIS checks the origin)
/// - `Content-Security-Policy` from [`content_security_policy`]
/// - `Permissions-Policy` denying sensitive features
/// - `Cache-Control: no-store, max-age=0` (pages carry per-session state)
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` (GIS popup)
/// - `X-DNS-Prefetch-Control: off`
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let request_nonce = request.extensions().get::<CspNonce>().cloned();
    let mut response = next.run(request).await;

    let nonce = request_nonce.or_else(|| response.extensions().get::<CspNonce>().cloned());
    let csp = content_security_policy(nonce.as_ref().map(CspNonce::value));

    let is_static = response
        .headers()
        .get(axum::http::header::CACHE_CONTROL)
        .is_some();
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(), \
             browsing-topics=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             interest-cohort=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(), \
             usb=()",
        ),
    );

    if !is_static {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, max-age=0"),
        );
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}
