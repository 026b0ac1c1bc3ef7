//! Shared test helpers and mock collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pairloop::error::TeamError;
use pairloop::participant::{Participant, Persona};
use pairloop::program::ProgramStore;
use pairloop::provider::CompletionProvider;
use pairloop::tester::TestRunner;
use pairloop::transcript::TranscriptSink;
use pairloop::types::Message;

/// A provider that replays queued replies and records every prompt.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, TeamError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Provider that answers with `replies` in order.
    pub fn with_replies<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::default();
        for reply in replies {
            provider.queue(reply);
        }
        Arc::new(provider)
    }

    pub fn queue(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn queue_error(&self, error: TeamError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Every prompt received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _model_id: &str, messages: &[Message]) -> Result<Message, TeamError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(Message::assistant(text)),
            Some(Err(e)) => Err(e),
            None => Ok(Message::assistant("Carrying on.")),
        }
    }
}

/// A provider that never answers.
pub struct HangingProvider;

#[async_trait]
impl CompletionProvider for HangingProvider {
    fn provider_name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _model_id: &str, _messages: &[Message]) -> Result<Message, TeamError> {
        std::future::pending().await
    }
}

/// A test runner that returns a fixed report and remembers what it saw.
pub struct RecordingTestRunner {
    report: String,
    seen: Mutex<Vec<String>>,
}

impl RecordingTestRunner {
    pub fn new(report: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            report: report.into(),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Rendered programs passed to `run`, oldest first.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestRunner for RecordingTestRunner {
    async fn run(&self, program: &ProgramStore) -> String {
        self.seen.lock().unwrap().push(program.render());
        self.report.clone()
    }
}

/// Transcript sink that keeps entries in memory.
#[derive(Default)]
pub struct MemoryTranscript {
    entries: Mutex<Vec<(String, Message)>>,
}

impl MemoryTranscript {
    pub fn speakers(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(speaker, _)| speaker.clone())
            .collect()
    }
}

impl TranscriptSink for MemoryTranscript {
    fn record(&self, speaker: &str, message: &Message) {
        self.entries
            .lock()
            .unwrap()
            .push((speaker.to_string(), message.clone()));
    }
}

pub fn owner(provider: Arc<dyn CompletionProvider>) -> Participant {
    Participant::new(Persona::product_owner("a test project"), "test-model", provider)
}

pub fn programmer(provider: Arc<dyn CompletionProvider>) -> Participant {
    Participant::new(Persona::programmer("a test project"), "test-model", provider)
}

/// Wrap `code` in a python fence with some prose around it.
pub fn code_reply(prose: &str, code: &str) -> String {
    format!("{prose}\n```python\n{code}```\nLet me know.")
}
