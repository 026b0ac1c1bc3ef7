//! One generic conversation participant, parameterised by persona.

pub mod persona;

pub use persona::{Anchor, Persona, TeamPersonas};

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::conversation::Conversation;
use crate::error::Result;
use crate::provider::CompletionProvider;
use crate::types::{Message, Role};

/// A model-backed collaborator that adds one reply per turn.
#[derive(Clone)]
pub struct Participant {
    persona: Persona,
    model: String,
    provider: Arc<dyn CompletionProvider>,
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("label", &self.persona.label)
            .field("model", &self.model)
            .field("provider", &self.provider.provider_name())
            .finish()
    }
}

impl Participant {
    pub fn new(
        persona: Persona,
        model: impl Into<String>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            persona,
            model: model.into(),
            provider,
        }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn label(&self) -> &str {
        &self.persona.label
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `[system, anchor, ...history]`, as sent to the provider.
    pub fn build_prompt(&self, history: &Conversation) -> Vec<Message> {
        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(Message::system(self.persona.system.clone()));
        prompt.push(Message::user(self.persona.anchor.render(history)));
        prompt.extend_from_slice(history.messages());
        prompt
    }

    /// Ask the provider for a reply without touching `history`.
    ///
    /// The reply always carries the `assistant` role, whatever label the
    /// provider put on it.
    pub async fn respond(&self, history: &Conversation) -> Result<Message> {
        let prompt = self.build_prompt(history);
        debug!(
            speaker = %self.persona.label,
            model = %self.model,
            prompt_len = prompt.len(),
            "requesting reply"
        );
        let reply = self.provider.complete(&self.model, &prompt).await?;
        Ok(Message::new(Role::Assistant, reply.content))
    }

    /// Take one turn: append exactly one reply to `history` and return it.
    ///
    /// On error `history` is left as it was.
    pub async fn take_turn<'h>(&self, history: &'h mut Conversation) -> Result<&'h Message> {
        let reply = self.respond(history).await?;
        info!(
            speaker = %self.persona.label,
            chars = reply.content.len(),
            has_code = reply.has_fence(),
            "reply received"
        );
        history.push(reply);
        Ok(&history.messages()[history.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TeamError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct Echo {
        seen: Mutex<Vec<Vec<Message>>>,
        reply: std::result::Result<Message, ()>,
    }

    #[async_trait]
    impl CompletionProvider for Echo {
        fn provider_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, _model: &str, messages: &[Message]) -> Result<Message> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.reply
                .clone()
                .map_err(|_| TeamError::Authentication("bad key".into()))
        }
    }

    fn participant(reply: std::result::Result<Message, ()>) -> (Participant, Arc<Echo>) {
        let echo = Arc::new(Echo {
            seen: Mutex::new(Vec::new()),
            reply,
        });
        let p = Participant::new(Persona::product_owner("a demo"), "m", echo.clone());
        (p, echo)
    }

    #[tokio::test]
    async fn turn_appends_one_assistant_reply() {
        let (owner, echo) = participant(Ok(Message::user("Let's start.")));
        let mut history = Conversation::from_messages(vec![Message::user("earlier")]);

        let reply = owner.take_turn(&mut history).await.unwrap().clone();

        assert_eq!(reply, Message::assistant("Let's start."));
        assert_eq!(history.len(), 2);
        let seen = echo.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 3);
        assert_eq!(seen[0][0].role, Role::System);
        assert_eq!(seen[0][1], Message::user("Your first response:"));
        assert_eq!(seen[0][2], Message::user("earlier"));
    }

    #[tokio::test]
    async fn failed_turn_leaves_history_untouched() {
        let (owner, _) = participant(Err(()));
        let mut history = Conversation::from_messages(vec![Message::user("earlier")]);
        let before = history.clone();

        assert!(owner.take_turn(&mut history).await.is_err());
        assert_eq!(history, before);
    }
}
