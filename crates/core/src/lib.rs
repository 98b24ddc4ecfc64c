//! Virtual Herbal Garden Core - Domain types and view state.
//!
//! This crate provides the types shared by the Virtual Herbal Garden
//! components:
//! - `web` - Server-rendered garden site
//! - `cli` - Terminal client for the plant backend
//!
//! # Architecture
//!
//! The core crate contains only types and state machines - no I/O, no HTTP
//! clients, no async runtime. Every operation that talks to the backend lives
//! in the `web` crate; the state machines here only decide what a completed
//! request is allowed to change.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for plant ids, user ids and emails
//! - [`plant`] - Plant records
//! - [`bookmarks`] - The per-user bookmark set and its update contract
//! - [`catalog`] - Search box and plant list state
//! - [`chat`] - AI chat transcript
//! - [`identify`] - Image identification state
//! - [`questions`] - Canned AI questions about a plant

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bookmarks;
pub mod catalog;
pub mod chat;
pub mod identify;
pub mod plant;
pub mod questions;
pub mod types;

pub use bookmarks::{BookmarkStore, RefreshTicket, ToggleTicket};
pub use catalog::{FetchTicket, ListPhase, PlantList, SearchBox, SearchTerm};
pub use chat::{ChatMessage, ChatRejection, ChatTranscript, PendingTurn, Sender};
pub use identify::{
    IdentifyError, IdentifyPhase, IdentifyState, Prediction, SelectedImage, UploadTicket,
};
pub use plant::Plant;
pub use questions::PlantQuestion;
pub use types::*;
