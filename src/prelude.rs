//! Convenience re-exports for common use.

pub use crate::config::{ProviderCredentials, TeamConfig};
pub use crate::conversation::Conversation;
pub use crate::error::{Result, TeamError};
pub use crate::orchestrator::{Orchestrator, RunOptions, RunReport, RunStatus};
pub use crate::participant::{Participant, Persona};
pub use crate::program::{CodeMerger, ProgramStore};
pub use crate::provider::{create_provider, CompletionProvider};
pub use crate::tester::TestRunner;
pub use crate::transcript::TranscriptSink;
pub use crate::types::{KeywordMatch, Message, Role};
