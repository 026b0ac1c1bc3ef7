//! Shared turn history between the two participants.

pub mod compaction;
pub mod perspective;

pub use compaction::HistoryCompactor;
pub use perspective::invert;

use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Ordered history both participants contribute to.
///
/// Holds neither participant's system prompt nor its anchor message. Messages
/// are only ever appended; the compactor may rewrite content in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn first(&self) -> Option<&Message> {
        self.messages.first()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Message `offset` places from the end; `1` is the last message.
    pub fn from_end(&self, offset: usize) -> Option<&Message> {
        let index = self.messages.len().checked_sub(offset)?;
        self.messages.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Message> {
        self.messages.get_mut(index)
    }

    /// The last `n` messages, oldest first.
    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Flip every message to the other participant's point of view.
    pub fn invert(&mut self) {
        for message in &mut self.messages {
            message.role = message.role.inverted();
        }
    }

    /// A copy seen from the other participant's point of view.
    pub fn inverted(&self) -> Self {
        Self {
            messages: invert(&self.messages),
        }
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self::from_messages(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_end_counts_from_one() {
        let convo = Conversation::from_messages(vec![
            Message::assistant("a"),
            Message::user("b"),
            Message::assistant("c"),
        ]);
        assert_eq!(convo.from_end(1).unwrap().content, "c");
        assert_eq!(convo.from_end(3).unwrap().content, "a");
        assert!(convo.from_end(4).is_none());
        assert!(convo.from_end(0).is_none());
    }

    #[test]
    fn tail_is_clamped() {
        let convo = Conversation::from_messages(vec![Message::user("only")]);
        assert_eq!(convo.tail(4).len(), 1);
    }

    #[test]
    fn serializes_as_plain_message_list() {
        let convo = Conversation::from_messages(vec![Message::user("hi")]);
        assert_eq!(
            serde_json::to_string(&convo).unwrap(),
            r#"[{"role":"user","content":"hi"}]"#
        );
    }
}
