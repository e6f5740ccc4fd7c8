//! A session is the conversation between one browser tab and the assistant.
//!
//! The session is a small state machine. A user turn is stored by `submit`
//! before any generation starts, and `complete_reply` only lands while the
//! session still waits for that reply.
use crate::completion::{ChatMessage, SenderType};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingReply,
}

/// Conversation history plus the text currently in the input field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    messages: Vec<ChatMessage>,
    input: String,
    state: ChatState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    /// Replace the text of the input field.
    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
    }

    /// Submit `text` as a user turn.
    ///
    /// The input field is always cleared. Returns `true` when a turn was
    /// appended; blank text, or a submit while a reply is pending, leaves the
    /// history untouched.
    pub fn submit(&mut self, text: &str) -> bool {
        self.input.clear();
        let text = text.trim();
        if text.is_empty() || self.state == ChatState::AwaitingReply {
            return false;
        }
        self.messages.push(ChatMessage {
            sender: SenderType::User,
            text: text.to_string(),
        });
        self.state = ChatState::AwaitingReply;
        true
    }

    /// Content of the user turn waiting for a reply.
    pub fn pending_prompt(&self) -> Option<&str> {
        match self.state {
            ChatState::AwaitingReply => self
                .messages
                .last()
                .filter(|m| m.sender == SenderType::User)
                .map(|m| m.text.as_str()),
            ChatState::Idle => None,
        }
    }

    /// Append the assistant turn answering the pending prompt.
    ///
    /// Returns `false` and drops the reply when nothing is pending, e.g. the
    /// session was reset while the model was generating.
    pub fn complete_reply(&mut self, text: &str) -> bool {
        if self.state != ChatState::AwaitingReply {
            return false;
        }
        self.messages.push(ChatMessage {
            sender: SenderType::Assistant,
            text: text.to_string(),
        });
        self.state = ChatState::Idle;
        true
    }

    /// Give up on the pending reply after a failed generation.
    ///
    /// The user turn stays in the history and the session returns to `Idle`
    /// so the next submit is accepted.
    pub fn abandon_reply(&mut self) -> bool {
        if self.state != ChatState::AwaitingReply {
            return false;
        }
        self.state = ChatState::Idle;
        true
    }

    /// Clear the conversation history and the input field.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.input.clear();
        self.state = ChatState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_pairs(n: usize) -> Session {
        let mut session = Session::new();
        for i in 0..n {
            assert!(session.submit(&format!("question {i}")));
            assert!(session.complete_reply(&format!("answer {i}")));
        }
        session
    }

    #[test]
    fn test_blank_submit_is_noop() {
        for blank in ["", " ", "\t", "\n  \r\n", "   \t "] {
            let mut session = session_with_pairs(2);
            let before = session.messages().to_vec();
            assert!(!session.submit(blank));
            assert_eq!(session.messages(), before.as_slice());
            assert_eq!(session.state(), ChatState::Idle);
            assert!(session.pending_prompt().is_none());
        }
    }

    #[test]
    fn test_submit_appends_user_turn_then_reply_appends_assistant_turn() {
        let mut session = Session::new();
        session.set_input("  What is the capital of France?  ");

        assert!(session.submit("  What is the capital of France?  "));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.input(), "");
        assert_eq!(session.state(), ChatState::AwaitingReply);
        assert_eq!(
            session.pending_prompt(),
            Some("What is the capital of France?")
        );

        assert!(session.complete_reply("Paris"));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.state(), ChatState::Idle);
        assert_eq!(session.messages()[1].sender, SenderType::Assistant);
        assert_eq!(session.messages()[1].text, "Paris");
    }

    #[test]
    fn test_submit_while_awaiting_reply_is_ignored() {
        let mut session = Session::new();
        assert!(session.submit("first"));
        assert!(!session.submit("second"));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.pending_prompt(), Some("first"));
    }

    #[test]
    fn test_reply_without_pending_prompt_is_dropped() {
        let mut session = Session::new();
        assert!(!session.complete_reply("orphan"));
        assert!(session.messages().is_empty());

        assert!(session.submit("hello"));
        session.reset();
        assert!(!session.complete_reply("late"));
        assert_eq!(session, Session::new());
    }

    #[test]
    fn test_abandoned_reply_accepts_next_submit() {
        let mut session = Session::new();
        assert!(session.submit("old question"));
        assert!(session.abandon_reply());
        assert_eq!(session.state(), ChatState::Idle);
        assert!(session.pending_prompt().is_none());
        assert!(!session.abandon_reply());

        assert!(session.submit("new question"));
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.pending_prompt(), Some("new question"));
        assert!(session.complete_reply("answer"));
        assert_eq!(session.messages()[0].text, "old question");
        assert_eq!(session.messages()[2].text, "answer");
    }

    #[test]
    fn test_turns_alternate() {
        let session = session_with_pairs(3);
        for (i, message) in session.messages().iter().enumerate() {
            let expected = if i % 2 == 0 {
                SenderType::User
            } else {
                SenderType::Assistant
            };
            assert_eq!(message.sender, expected);
        }
    }

    #[test]
    fn test_reset_clears_history_and_input() {
        let mut session = session_with_pairs(1);
        session.set_input("draft");
        assert!(session.submit("pending"));
        session.set_input("another draft");

        session.reset();
        assert!(session.messages().is_empty());
        assert_eq!(session.input(), "");
        assert_eq!(session.state(), ChatState::Idle);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut once = session_with_pairs(2);
        once.reset();
        let mut twice = session_with_pairs(2);
        twice.reset();
        twice.reset();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_pairs_then_reset_round_trip() {
        for n in [0, 1, 5] {
            let mut session = session_with_pairs(n);
            assert_eq!(session.messages().len(), 2 * n);
            session.reset();
            assert_eq!(session, Session::new());
        }
    }
}
