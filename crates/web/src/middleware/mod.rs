//! HTTP middleware stack for the garden site.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for script tags)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Security headers (CSP, COOP, etc.)
//! 7. Rate limiting (governor) on the AI and identification POSTs

pub mod csp;
pub mod garden;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use garden::Garden;
pub use rate_limit::{ai_rate_limiter, identify_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
