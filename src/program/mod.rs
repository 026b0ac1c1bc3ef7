//! The program under construction and the machinery that patches it.

pub mod fence;
pub mod merge;
pub mod parser;
pub mod store;

pub use fence::{extract_code_block, redact_code_blocks, CODE_PLACEHOLDER};
pub use merge::{CodeMerger, MergeReport};
pub use store::{Definition, DefinitionKind, ProgramStore};
