//! Role inversion between the two participants.
//!
//! Both participants are driven by the same completion mechanism from
//! symmetric prompts, so each must see its own earlier replies as
//! `assistant` and the other's as `user`. Flipping the labels between turns
//! hands the history over.

use crate::types::Message;

/// Swap `user` and `assistant` on every message; content is untouched.
pub fn invert(messages: &[Message]) -> Vec<Message> {
    messages.iter().map(Message::inverted).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Conversation;
    use crate::types::Role;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<Message> {
        vec![
            Message::assistant("We need a bar chart endpoint."),
            Message::user("```python\ndef bar():\n    pass\n```"),
            Message::assistant("KeywordTest"),
            Message::user("Traceback: NameError"),
        ]
    }

    #[test]
    fn inversion_swaps_roles_only() {
        let inverted = invert(&sample());
        let roles: Vec<Role> = inverted.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
        for (before, after) in sample().iter().zip(&inverted) {
            assert_eq!(before.content, after.content);
        }
    }

    #[test]
    fn inversion_is_involutive() {
        let original = sample();
        assert_eq!(invert(&invert(&original)), original);

        let mut convo = Conversation::from_messages(original.clone());
        convo.invert();
        convo.invert();
        assert_eq!(convo.messages(), original.as_slice());
    }

    #[test]
    fn in_place_and_pure_inversion_agree() {
        let convo = Conversation::from_messages(sample());
        let mut in_place = convo.clone();
        in_place.invert();
        assert_eq!(in_place, convo.inverted());
    }

    #[test]
    fn system_messages_keep_their_role() {
        let inverted = invert(&[Message::system("persona")]);
        assert_eq!(inverted[0].role, Role::System);
    }

    #[test]
    fn empty_history_inverts_to_empty() {
        assert!(invert(&[]).is_empty());
    }
}
