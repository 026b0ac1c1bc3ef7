//! Role instructions and anchor messages for each participant.

use crate::config::PersonaOverrides;
use crate::conversation::Conversation;

const TEAM_BRIEF: &str = "You are one half of a pair of assistants building {project} in Python. \
One of you is the programmer and the other is the product owner. Only the most recent messages \
still show code blocks; older ones are hidden. The program must have a `main` function. Be brief \
and skip pleasantries. At any point the product owner may reply \"KeywordTest\" to have a tester \
run the current program, or \"KeywordDone\" to finish. After a test, keep iterating on what the \
tester reported until you are done or out of time. If the two of you start trading compliments \
instead of making progress, reply \"KeywordDone\".";

const PRODUCT_OWNER_BRIEF: &str = "You are the product owner. Keep the programmer moving and review \
their code for quality. It is just the two of you from here. You may discuss the design before any \
code is written, but keep it short. Reply \"KeywordDone\" when the work is finished. Reply \
\"KeywordTest\" to run the program through the tester, whose summary or errors come back to you \
instead of going to the programmer.";

const PROGRAMMER_BRIEF: &str = "You are a seasoned programmer. Whenever you change code, send the \
complete function or class you are changing. Definitions you leave out are kept as they are; every \
definition you send replaces the old one entirely or is added as new. Send one ```python block per \
reply and keep it syntactically valid, using `pass` for anything left unimplemented.";

const TESTER_BRIEF: &str = "You are a tester for a Python program written by a pair of assistants \
building {project}. You receive the program and the output of running it. Reply with a short \
summary of what the run shows, or list the errors it produced and their likely cause. Do not \
rewrite the program.";

const PRODUCT_OWNER_ANCHOR: &str = "Your first response:";
const PROGRAMMER_ANCHOR_PREFIX: &str = "Here is the first message from your colleague: ";
const TESTER_ANCHOR: &str = "Here is the latest test run:";

/// The user message placed right after the system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// The same text every turn.
    Fixed(String),
    /// `prefix` followed by the first message of the shared history.
    FirstMessage { prefix: String },
}

impl Anchor {
    pub fn render(&self, history: &Conversation) -> String {
        match self {
            Anchor::Fixed(text) => text.clone(),
            Anchor::FirstMessage { prefix } => match history.first() {
                Some(first) => format!("{prefix}{}", first.content),
                None => prefix.clone(),
            },
        }
    }
}

/// Everything that distinguishes one participant from another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// Speaker label used in logs and transcripts.
    pub label: String,
    pub system: String,
    pub anchor: Anchor,
}

impl Persona {
    pub fn new(label: impl Into<String>, system: impl Into<String>, anchor: Anchor) -> Self {
        Self {
            label: label.into(),
            system: system.into(),
            anchor,
        }
    }

    pub fn product_owner(project: &str) -> Self {
        Self::product_owner_with(project, PRODUCT_OWNER_BRIEF)
    }

    /// Product owner with custom role instructions.
    pub fn product_owner_with(project: &str, brief: &str) -> Self {
        Self::new(
            "PRODUCT OWNER",
            team_system(project, brief),
            Anchor::Fixed(PRODUCT_OWNER_ANCHOR.to_string()),
        )
    }

    pub fn programmer(project: &str) -> Self {
        Self::programmer_with(project, PROGRAMMER_BRIEF)
    }

    /// Programmer with custom role instructions.
    pub fn programmer_with(project: &str, brief: &str) -> Self {
        Self::new(
            "PROGRAMMER",
            team_system(project, brief),
            Anchor::FirstMessage {
                prefix: PROGRAMMER_ANCHOR_PREFIX.to_string(),
            },
        )
    }

    pub fn tester(project: &str) -> Self {
        Self::tester_with(project, TESTER_BRIEF)
    }

    /// Tester with custom instructions. The tester is not part of the pair,
    /// so it does not get the team brief.
    pub fn tester_with(project: &str, brief: &str) -> Self {
        Self::new(
            "TESTER",
            brief.replace("{project}", project),
            Anchor::Fixed(TESTER_ANCHOR.to_string()),
        )
    }
}

fn team_system(project: &str, brief: &str) -> String {
    format!("{}\n\n{brief}", TEAM_BRIEF.replace("{project}", project))
}

/// The three personas of one run.
#[derive(Debug, Clone)]
pub struct TeamPersonas {
    pub product_owner: Persona,
    pub programmer: Persona,
    pub tester: Persona,
}

impl TeamPersonas {
    pub fn new(project: &str, overrides: &PersonaOverrides) -> Self {
        Self {
            product_owner: Persona::product_owner_with(
                project,
                overrides.product_owner.as_deref().unwrap_or(PRODUCT_OWNER_BRIEF),
            ),
            programmer: Persona::programmer_with(
                project,
                overrides.programmer.as_deref().unwrap_or(PROGRAMMER_BRIEF),
            ),
            tester: Persona::tester_with(
                project,
                overrides.tester.as_deref().unwrap_or(TESTER_BRIEF),
            ),
        }
    }
}
