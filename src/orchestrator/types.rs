//! Core run types for the orchestrator.

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::config::{TeamConfig, MAX_ROUNDS};
use crate::conversation::Conversation;
use crate::error::{ErrorCategory, RecoverySuggestion};
use crate::program::ProgramStore;
use crate::types::{KeywordMatch, Message};

/// Unique run identifier.
pub type RunId = Uuid;

/// Knobs for one run.
#[derive(Debug, Clone, Builder)]
pub struct RunOptions {
    /// Upper bound on product-owner turns.
    #[builder(default = MAX_ROUNDS)]
    pub max_rounds: usize,
    #[builder(default)]
    pub keyword_match: KeywordMatch,
    /// Feedback turns after a failed merge before the block is given up on.
    #[builder(default = 2)]
    pub max_merge_retries: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<&TeamConfig> for RunOptions {
    fn from(config: &TeamConfig) -> Self {
        Self::builder()
            .max_rounds(config.max_rounds)
            .keyword_match(config.keyword_match)
            .max_merge_retries(config.max_merge_retries)
            .build()
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// A participant sent the done keyword.
    Done,
    /// Every round was used without anyone finishing.
    MaxRoundsExceeded,
    /// A provider call failed after retries.
    Failed,
    Canceled,
}

impl RunStatus {
    /// Process exit code for the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Done => 0,
            RunStatus::Failed => 1,
            RunStatus::MaxRoundsExceeded => 2,
            RunStatus::Canceled => 130,
        }
    }
}

/// Who produced a message, as shown in transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    #[strum(serialize = "PRODUCT OWNER")]
    ProductOwner,
    #[strum(serialize = "PROGRAMMER")]
    Programmer,
    #[strum(serialize = "TESTER")]
    Tester,
    /// Merge feedback sent back to the programmer.
    #[strum(serialize = "MERGER")]
    Merger,
}

/// Step of a round in which a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TurnPhase {
    ProductOwner,
    Programmer,
    MergeFeedback,
}

/// What was going on when a run failed.
#[derive(Debug, Clone)]
pub struct FailureContext {
    pub round: usize,
    pub phase: TurnPhase,
    pub error: String,
    pub category: ErrorCategory,
    pub suggestion: RecoverySuggestion,
    /// Up to the last four messages of the shared history.
    pub recent_messages: Vec<Message>,
    /// Most recent code block in the history, if any.
    pub offending_code: Option<String>,
}

/// Result of a run. Conversation and program are returned in every case.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub status: RunStatus,
    /// Product-owner turns taken.
    pub rounds: usize,
    pub finished_by: Option<Speaker>,
    pub conversation: Conversation,
    pub program: ProgramStore,
    pub failure: Option<FailureContext>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn is_done(&self) -> bool {
        self.status == RunStatus::Done
    }
}
