//! Free-text control keywords embedded in participant replies.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Token asking the orchestrator to run the program through the tester.
pub const TEST_KEYWORD: &str = "keywordtest";
/// Token asking the orchestrator to end the run.
pub const DONE_KEYWORD: &str = "keyworddone";

/// How a keyword token is recognised in a reply.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeywordMatch {
    /// Case-insensitive substring anywhere in the reply, code and quotes included.
    #[default]
    Substring,
    /// The whole trimmed reply must be the token.
    WholeMessage,
}

impl KeywordMatch {
    /// Whether `content` carries `keyword` (lowercase) under this mode.
    pub fn matches(self, content: &str, keyword: &str) -> bool {
        match self {
            KeywordMatch::Substring => content.to_lowercase().contains(keyword),
            KeywordMatch::WholeMessage => {
                let trimmed = content
                    .trim()
                    .trim_matches(|c| c == '"' || c == '\'' || c == '`')
                    .trim_end_matches(['.', '!']);
                trimmed.eq_ignore_ascii_case(keyword)
            }
        }
    }
}

/// Control signal derived from a single reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum KeywordSignal {
    None,
    Test,
    Done,
}

impl KeywordSignal {
    /// Derive the signal for a product-owner reply. `Test` wins over `Done`.
    pub fn detect(content: &str, mode: KeywordMatch) -> Self {
        if mode.matches(content, TEST_KEYWORD) {
            KeywordSignal::Test
        } else if mode.matches(content, DONE_KEYWORD) {
            KeywordSignal::Done
        } else {
            KeywordSignal::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_match_ignores_case_and_position() {
        let mode = KeywordMatch::Substring;
        assert_eq!(KeywordSignal::detect("KeywordTest", mode), KeywordSignal::Test);
        assert_eq!(
            KeywordSignal::detect("Looks good. KEYWORDDONE", mode),
            KeywordSignal::Done
        );
        assert_eq!(
            KeywordSignal::detect("Please add a CLI flag.", mode),
            KeywordSignal::None
        );
    }

    #[test]
    fn substring_match_fires_inside_code() {
        let reply = "```python\nprint('keyworddone')\n```";
        assert_eq!(
            KeywordSignal::detect(reply, KeywordMatch::Substring),
            KeywordSignal::Done
        );
    }

    #[test]
    fn test_takes_precedence_over_done() {
        assert_eq!(
            KeywordSignal::detect("KeywordDone, but first KeywordTest", KeywordMatch::Substring),
            KeywordSignal::Test
        );
    }

    #[test]
    fn whole_message_requires_the_bare_token() {
        let mode = KeywordMatch::WholeMessage;
        assert_eq!(KeywordSignal::detect("  KeywordTest.\n", mode), KeywordSignal::Test);
        assert_eq!(KeywordSignal::detect("\"KeywordDone\"", mode), KeywordSignal::Done);
        assert_eq!(
            KeywordSignal::detect("print('keyworddone')", mode),
            KeywordSignal::None
        );
    }

    #[test]
    fn match_mode_parses_from_config_name() {
        assert_eq!(
            "whole_message".parse::<KeywordMatch>().unwrap(),
            KeywordMatch::WholeMessage
        );
    }
}
