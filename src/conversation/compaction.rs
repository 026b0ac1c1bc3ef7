//! Hide superseded code to keep prompts short.

use std::borrow::Cow;

use tracing::debug;

use super::Conversation;
use crate::program::redact_code_blocks;
use crate::types::Role;

/// Minimum history length before anything is compacted.
pub const COMPACTION_THRESHOLD: usize = 4;

/// Offsets redacted once the programmer has replied, counted back from its
/// first reply of the round (`1` is that reply).
const TARGET_OFFSETS: [usize; 2] = [3, 4];

/// Redacts code blocks at fixed offsets from the end of the history.
///
/// Right after the programmer replies, offsets 3 and 4 hold the previous
/// round's pair, whose code the newest reply supersedes. The merged program
/// keeps the real definitions, so the prompt only needs the placeholder.
#[derive(Debug, Clone, Default)]
pub struct HistoryCompactor;

impl HistoryCompactor {
    pub fn new() -> Self {
        Self
    }

    /// Redact code in the target messages. Returns how many messages changed.
    ///
    /// Does nothing below [`COMPACTION_THRESHOLD`] messages. Messages without
    /// a visible code block keep their content byte for byte.
    pub fn compact(&self, conversation: &mut Conversation) -> usize {
        let round_start = conversation.len().saturating_sub(2);
        self.compact_round(conversation, round_start)
    }

    /// Compact after a round whose product-owner message sits at
    /// `round_start`.
    ///
    /// Offsets are taken as if the history ended at the programmer's first
    /// reply, so merge feedback turns later in the round do not shift them.
    /// Programmer replies of this round that a later reply superseded are
    /// redacted as well.
    pub fn compact_round(&self, conversation: &mut Conversation, round_start: usize) -> usize {
        let end = (round_start + 2).min(conversation.len());
        if end < COMPACTION_THRESHOLD {
            return 0;
        }

        let mut changed = 0;
        for offset in TARGET_OFFSETS {
            if redact(conversation, end - offset) {
                changed += 1;
            }
        }

        let last = conversation.len() - 1;
        for index in round_start + 1..last {
            let superseded = conversation
                .messages()
                .get(index)
                .is_some_and(|m| m.role == Role::Assistant);
            if superseded && redact(conversation, index) {
                changed += 1;
            }
        }

        if changed > 0 {
            debug!(changed, len = conversation.len(), "compacted history");
        }
        changed
    }
}

fn redact(conversation: &mut Conversation, index: usize) -> bool {
    let Some(message) = conversation.get_mut(index) else {
        return false;
    };
    match redact_code_blocks(&message.content) {
        Cow::Owned(redacted) => {
            message.content = redacted;
            true
        }
        Cow::Borrowed(_) => false,
    }
}
