//! Session-related types.
//!
//! The cookie session holds the garden registry key, the one-shot flash
//! message and the bookmarked-only preference.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// How a flash message is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Info,
    Error,
}

impl FlashKind {
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Info => "flash flash-info",
            Self::Error => "flash flash-error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// Store the flash for the next page.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set(self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::FLASH, self).await
    }

    /// Remove and return the pending flash, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn take(session: &Session) -> Result<Option<Self>, tower_sessions::session::Error> {
        session.remove(keys::FLASH).await
    }
}

/// Session keys.
pub mod keys {
    /// Key of the garden registry entry for this browser.
    pub const GARDEN_ID: &str = "garden_id";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";

    /// Key for the bookmarked-only list filter.
    pub const BOOKMARKED_ONLY: &str = "bookmarked_only";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    #[tokio::test]
    async fn test_flash_is_one_shot() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        Flash::error("Please sign in to bookmark plants!")
            .set(&session)
            .await
            .ok();

        let flash = Flash::take(&session).await.ok().flatten();
        assert_eq!(
            flash.map(|f| f.message).as_deref(),
            Some("Please sign in to bookmark plants!")
        );
        assert_eq!(Flash::take(&session).await.ok().flatten(), None);
    }
}
