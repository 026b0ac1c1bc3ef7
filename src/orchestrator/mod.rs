//! The bounded round loop that drives a product-owner/programmer pair.

pub mod types;

pub use types::{FailureContext, RunId, RunOptions, RunReport, RunStatus, Speaker, TurnPhase};

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::TeamConfig;
use crate::conversation::{Conversation, HistoryCompactor};
use crate::error::{MergeError, Result, TeamError};
use crate::participant::{Participant, TeamPersonas};
use crate::program::{extract_code_block, CodeMerger, ProgramStore};
use crate::provider::CompletionProvider;
use crate::tester::{ModelTestRunner, ProcessTestRunner, TestRunner};
use crate::transcript::{FileTranscript, TracingTranscript, TranscriptSink};
use crate::types::{KeywordSignal, Message, DONE_KEYWORD};

const FAILURE_CONTEXT_MESSAGES: usize = 4;

/// Mutable state of one run, handed back in the report.
struct RunState {
    run_id: RunId,
    conversation: Conversation,
    program: ProgramStore,
    rounds: usize,
}

impl RunState {
    fn finish(
        self,
        status: RunStatus,
        finished_by: Option<Speaker>,
        failure: Option<FailureContext>,
    ) -> RunReport {
        info!(
            run_id = %self.run_id,
            %status,
            rounds = self.rounds,
            definitions = self.program.len(),
            "run finished"
        );
        RunReport {
            run_id: self.run_id,
            status,
            rounds: self.rounds,
            finished_by,
            conversation: self.conversation,
            program: self.program,
            failure,
            finished_at: Utc::now(),
        }
    }
}

/// Alternates the two participants for at most `max_rounds` rounds.
///
/// Each round the product owner speaks first. A test keyword sends the
/// program to the tester and the result back to the product owner; a done
/// keyword ends the run. Otherwise the history is inverted, the programmer
/// replies, its code is merged into the program and older code in the
/// history is hidden.
pub struct Orchestrator {
    owner: Participant,
    programmer: Participant,
    tester: Arc<dyn TestRunner>,
    transcript: Option<Arc<dyn TranscriptSink>>,
    merger: CodeMerger,
    compactor: HistoryCompactor,
    options: RunOptions,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(owner: Participant, programmer: Participant, tester: Arc<dyn TestRunner>) -> Self {
        Self {
            owner,
            programmer,
            tester,
            transcript: None,
            merger: CodeMerger::new(),
            compactor: HistoryCompactor::new(),
            options: RunOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Assemble a full team from configuration around one provider.
    pub fn from_config(config: &TeamConfig, provider: Arc<dyn CompletionProvider>) -> Result<Self> {
        let personas = TeamPersonas::new(&config.project, &config.personas);
        let owner = Participant::new(personas.product_owner, &config.model, provider.clone());
        let programmer = Participant::new(personas.programmer, &config.model, provider.clone());

        let process = ProcessTestRunner::new(&config.interpreter).with_timeout(config.test_timeout());
        let tester: Arc<dyn TestRunner> = if config.review_tests {
            let reviewer = Participant::new(personas.tester, &config.model, provider);
            Arc::new(ModelTestRunner::new(process, reviewer))
        } else {
            Arc::new(process)
        };

        let transcript: Arc<dyn TranscriptSink> = match &config.transcript_path {
            Some(path) => Arc::new(FileTranscript::open(path)?),
            None => Arc::new(TracingTranscript),
        };
        Ok(Self::new(owner, programmer, tester)
            .with_options(RunOptions::from(config))
            .with_transcript(transcript))
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptSink>) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels runs of this orchestrator.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run with an empty program.
    pub async fn run(&self) -> RunReport {
        self.run_with(ProgramStore::new()).await
    }

    /// Run starting from `program`.
    pub async fn run_with(&self, program: ProgramStore) -> RunReport {
        let mut state = RunState {
            run_id: Uuid::new_v4(),
            conversation: Conversation::new(),
            program,
            rounds: 0,
        };
        info!(
            run_id = %state.run_id,
            max_rounds = self.options.max_rounds,
            model = %self.owner.model(),
            "run started"
        );

        for round in 1..=self.options.max_rounds {
            if self.cancel.is_cancelled() {
                return state.finish(RunStatus::Canceled, None, None);
            }

            let round_start = state.conversation.len();
            let owner_turn = self
                .guarded(self.owner.take_turn(&mut state.conversation))
                .await
                .map(Message::clone);
            let owner_reply = match owner_turn {
                Ok(reply) => reply,
                Err(e) => return self.abort(state, round, TurnPhase::ProductOwner, e),
            };
            state.rounds = round;
            self.record(Speaker::ProductOwner, &owner_reply);

            match KeywordSignal::detect(&owner_reply.content, self.options.keyword_match) {
                KeywordSignal::Test => {
                    info!(round, "product owner asked for a test run");
                    let result = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => None,
                        result = self.tester.run(&state.program) => Some(result),
                    };
                    let Some(result) = result else {
                        return state.finish(RunStatus::Canceled, None, None);
                    };
                    let result = Message::user(result);
                    self.record(Speaker::Tester, &result);
                    state.conversation.push(result);
                    continue;
                }
                KeywordSignal::Done => {
                    info!(round, speaker = %Speaker::ProductOwner, "done keyword received");
                    return state.finish(RunStatus::Done, Some(Speaker::ProductOwner), None);
                }
                KeywordSignal::None => {}
            }

            state.conversation.invert();

            let programmer_reply = match self.programmer_turn(&mut state, round).await {
                Ok(reply) => reply,
                Err((phase, e)) => return self.abort(state, round, phase, e),
            };

            self.compactor
                .compact_round(&mut state.conversation, round_start);

            if self
                .options
                .keyword_match
                .matches(&programmer_reply.content, DONE_KEYWORD)
            {
                info!(round, speaker = %Speaker::Programmer, "done keyword received");
                return state.finish(RunStatus::Done, Some(Speaker::Programmer), None);
            }

            state.conversation.invert();
        }

        warn!(
            run_id = %state.run_id,
            max_rounds = self.options.max_rounds,
            "round limit reached without a done keyword"
        );
        state.finish(RunStatus::MaxRoundsExceeded, None, None)
    }

    /// Programmer reply plus merge, with feedback turns for blocks that fail
    /// to merge. Returns the last reply.
    async fn programmer_turn(
        &self,
        state: &mut RunState,
        round: usize,
    ) -> std::result::Result<Message, (TurnPhase, TeamError)> {
        let mut reply = self
            .guarded(self.programmer.take_turn(&mut state.conversation))
            .await
            .map(Message::clone)
            .map_err(|e| (TurnPhase::Programmer, e))?;
        self.record(Speaker::Programmer, &reply);

        let mut retries = 0;
        loop {
            let err = match self.merger.merge(&mut state.program, &reply.content) {
                Ok(Some(report)) => {
                    info!(
                        round,
                        added = ?report.added,
                        replaced = ?report.replaced,
                        "merged programmer code"
                    );
                    return Ok(reply);
                }
                Ok(None) => return Ok(reply),
                Err(err) => err,
            };

            if retries >= self.options.max_merge_retries {
                warn!(
                    round,
                    line = err.line(),
                    error = %err,
                    "code block still does not merge, continuing without it"
                );
                return Ok(reply);
            }
            retries += 1;
            warn!(round, retries, line = err.line(), error = %err, "code block rejected");

            let feedback = Message::user(merge_feedback(&err));
            self.record(Speaker::Merger, &feedback);
            state.conversation.push(feedback);

            reply = self
                .guarded(self.programmer.take_turn(&mut state.conversation))
                .await
                .map(Message::clone)
                .map_err(|e| (TurnPhase::MergeFeedback, e))?;
            self.record(Speaker::Programmer, &reply);
        }
    }

    /// Await `future` unless the run is canceled first.
    async fn guarded<T>(&self, future: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TeamError::Canceled),
            result = future => result,
        }
    }

    fn abort(&self, state: RunState, round: usize, phase: TurnPhase, error: TeamError) -> RunReport {
        if matches!(error, TeamError::Canceled) {
            info!(round, %phase, "run canceled");
            return state.finish(RunStatus::Canceled, None, None);
        }

        warn!(
            round,
            %phase,
            category = %error.category(),
            error = %error,
            "provider call failed"
        );
        let failure = FailureContext {
            round,
            phase,
            error: error.to_string(),
            category: error.category(),
            suggestion: error.recovery_suggestion(),
            recent_messages: state.conversation.tail(FAILURE_CONTEXT_MESSAGES).to_vec(),
            offending_code: latest_code(&state.conversation),
        };
        state.finish(RunStatus::Failed, None, Some(failure))
    }

    fn record(&self, speaker: Speaker, message: &Message) {
        if let Some(transcript) = &self.transcript {
            transcript.record(&speaker.to_string(), message);
        }
    }
}

/// Text sent back to the programmer when its code block does not merge.
pub fn merge_feedback(err: &MergeError) -> String {
    format!(
        "Your last code block could not be applied: {err}. None of its definitions were kept. \
Send the corrected definitions again in a single ```python block."
    )
}

fn latest_code(conversation: &Conversation) -> Option<String> {
    conversation
        .messages()
        .iter()
        .rev()
        .find_map(|m| extract_code_block(&m.content))
        .map(str::to_string)
}
