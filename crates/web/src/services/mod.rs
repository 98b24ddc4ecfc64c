//! Garden services.
//!
//! Each service runs one user action against the backend and records the
//! outcome in the caller's [`GardenSession`]. Session locks are never held
//! across a backend call.
//!
//! # Services
//!
//! - `session` - The per-session state container
//! - `session_observer` - Sign-in/sign-out reactions (user sync, bookmark refresh)
//! - `bookmarks` - Bookmark refresh and toggle
//! - `catalog` - Plant list and detail loading
//! - `chat` - AI assistant turns
//! - `questions` - Canned AI questions about a plant
//! - `identify` - Image identification

pub mod bookmarks;
pub mod catalog;
pub mod chat;
pub mod identify;
pub mod questions;
pub mod session;
pub mod session_observer;

pub use session::{AuthState, GardenSession};
