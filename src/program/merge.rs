//! Merge the programmer's code block into the program store.

use tracing::debug;

use super::fence::extract_code_block;
use super::parser::parse_definitions;
use super::store::ProgramStore;
use crate::error::MergeError;

/// Names touched by one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Names that were not in the store before.
    pub added: Vec<String>,
    /// Names whose definition was replaced.
    pub replaced: Vec<String>,
}

impl MergeReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.replaced.is_empty()
    }
}

/// Applies "patch by resending the whole definition" semantics.
///
/// The first python block of a message is parsed into top-level definitions;
/// each one is installed under its name, replacing any previous version.
/// Names the block does not mention stay as they were. The block is parsed in
/// full before anything is installed, so a bad block leaves the store as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeMerger;

impl CodeMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge the code carried by `content`. `Ok(None)` when there is no code.
    pub fn merge(
        &self,
        store: &mut ProgramStore,
        content: &str,
    ) -> Result<Option<MergeReport>, MergeError> {
        let Some(code) = extract_code_block(content) else {
            return Ok(None);
        };

        let definitions = parse_definitions(code)?;
        let mut report = MergeReport::default();
        for definition in definitions {
            let name = definition.name.clone();
            match store.install(definition) {
                Some(_) => report.replaced.push(name),
                None => report.added.push(name),
            }
        }

        debug!(
            added = report.added.len(),
            replaced = report.replaced.len(),
            "merged code block"
        );
        Ok(Some(report))
    }
}
