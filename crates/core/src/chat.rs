//! AI assistant transcript.

use serde::{Deserialize, Serialize};

/// Assistant turn appended when the chat call fails.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process that. Please try again.";

/// Error shown above the transcript when the chat call fails.
pub const CHAT_FAILED_MESSAGE: &str = "Failed to get response from AI. Please try again.";

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }

    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self.sender, Sender::User)
    }
}

/// Why a submission was not accepted.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRejection {
    #[error("message is empty")]
    Empty,
    #[error("a reply is still pending")]
    Busy,
}

/// A user turn waiting for the assistant's reply.
///
/// Consumed by [`ChatTranscript::answer`] or [`ChatTranscript::fail`].
#[derive(Debug)]
#[must_use]
pub struct PendingTurn {
    message: String,
}

impl PendingTurn {
    /// Text to send to the chat endpoint.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Ordered, append-only conversation with one pending reply at most.
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    busy: bool,
    error: Option<&'static str>,
}

impl ChatTranscript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub const fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Append a user turn and mark the transcript busy.
    ///
    /// # Errors
    ///
    /// Rejects blank input and any submission while a reply is pending;
    /// the transcript is unchanged in both cases.
    pub fn submit(&mut self, text: &str) -> Result<PendingTurn, ChatRejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatRejection::Empty);
        }
        if self.busy {
            return Err(ChatRejection::Busy);
        }

        self.messages.push(ChatMessage::user(text));
        self.busy = true;
        self.error = None;

        Ok(PendingTurn {
            message: text.to_owned(),
        })
    }

    /// Append the assistant's reply.
    pub fn answer(&mut self, turn: PendingTurn, reply: impl Into<String>) {
        drop(turn);
        self.messages.push(ChatMessage::assistant(reply));
        self.busy = false;
    }

    /// Append the fallback reply and record the error.
    pub fn fail(&mut self, turn: PendingTurn) {
        drop(turn);
        self.messages.push(ChatMessage::assistant(FALLBACK_REPLY));
        self.error = Some(CHAT_FAILED_MESSAGE);
        self.busy = false;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_order() {
        let mut chat = ChatTranscript::new();
        let turn = chat.submit("What is neem used for?").unwrap();
        assert_eq!(turn.message(), "What is neem used for?");
        assert_eq!(chat.messages().len(), 1);
        assert!(chat.is_busy());

        chat.answer(turn, "Neem is used for skin care.");
        let senders: Vec<_> = chat.messages().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Assistant]);
        assert!(!chat.is_busy());
        assert_eq!(chat.error(), None);
    }

    #[test]
    fn test_blank_input_ignored() {
        let mut chat = ChatTranscript::new();
        assert_eq!(chat.submit("   ").unwrap_err(), ChatRejection::Empty);
        assert!(chat.messages().is_empty());
    }

    #[test]
    fn test_busy_rejects_second_submission() {
        let mut chat = ChatTranscript::new();
        let _turn = chat.submit("first").unwrap();
        assert_eq!(chat.submit("second").unwrap_err(), ChatRejection::Busy);
        assert_eq!(chat.messages().len(), 1);
    }

    #[test]
    fn test_failure_appends_fallback() {
        let mut chat = ChatTranscript::new();
        let turn = chat.submit("  tulsi?  ").unwrap();
        chat.fail(turn);

        assert_eq!(chat.messages()[0].text, "tulsi?");
        assert_eq!(chat.messages()[1], ChatMessage::assistant(FALLBACK_REPLY));
        assert_eq!(chat.error(), Some(CHAT_FAILED_MESSAGE));

        // The next submission clears the error.
        let _turn = chat.submit("again").unwrap();
        assert_eq!(chat.error(), None);
    }
}
