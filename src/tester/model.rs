//! A tester model that reads the raw run output and reports back.

use async_trait::async_trait;
use tracing::warn;

use super::TestRunner;
use crate::conversation::Conversation;
use crate::participant::Participant;
use crate::program::ProgramStore;
use crate::types::Message;

/// Runs the program with `inner`, then has `reviewer` summarise the result.
///
/// Falls back to the raw output when the reviewer call fails.
pub struct ModelTestRunner<R> {
    inner: R,
    reviewer: Participant,
}

impl<R: TestRunner> ModelTestRunner<R> {
    pub fn new(inner: R, reviewer: Participant) -> Self {
        Self { inner, reviewer }
    }

    fn review_request(program: &ProgramStore, raw: &str) -> Conversation {
        Conversation::from_messages(vec![Message::user(format!(
            "Program:\n```python\n{}```\n\nRun output:\n{raw}",
            program.render()
        ))])
    }
}

#[async_trait]
impl<R: TestRunner> TestRunner for ModelTestRunner<R> {
    async fn run(&self, program: &ProgramStore) -> String {
        let raw = self.inner.run(program).await;
        if program.is_empty() {
            return raw;
        }

        let request = Self::review_request(program, &raw);
        match self.reviewer.respond(&request).await {
            Ok(review) => review.content,
            Err(e) => {
                warn!(error = %e, "tester review failed, reporting raw output");
                raw
            }
        }
    }
}
