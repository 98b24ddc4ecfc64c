//! Types stored in the cookie session.

pub mod session;

pub use session::{Flash, FlashKind, keys as session_keys};
