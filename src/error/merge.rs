//! Errors raised while merging a code block into the program.

use thiserror::Error;

/// A submitted block could not be merged. Nothing from the block is applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("line {line}: unexpected indent")]
    UnexpectedIndent { line: usize },

    #[error("line {line}: unmatched '{bracket}'")]
    UnmatchedBracket { line: usize, bracket: char },

    #[error("line {line}: '{bracket}' was never closed")]
    UnclosedBracket { line: usize, bracket: char },

    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("line {line}: expected an indented block after '{header}'")]
    MissingBody { line: usize, header: String },

    #[error("line {line}: invalid {keyword} definition")]
    InvalidDefinition { line: usize, keyword: &'static str },

    #[error("line {line}: decorator is not followed by a function or class")]
    DanglingDecorator { line: usize },

    #[error("line {line}: '{keyword}' has no statement to continue")]
    OrphanClause { line: usize, keyword: String },
}

impl MergeError {
    /// 1-based line within the code block where the problem was found.
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedIndent { line }
            | Self::UnmatchedBracket { line, .. }
            | Self::UnclosedBracket { line, .. }
            | Self::UnterminatedString { line }
            | Self::MissingBody { line, .. }
            | Self::InvalidDefinition { line, .. }
            | Self::DanglingDecorator { line }
            | Self::OrphanClause { line, .. } => *line,
        }
    }
}
