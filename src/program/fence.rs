//! Fenced python code blocks inside message text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Body left behind when a superseded code block is hidden.
pub const CODE_PLACEHOLDER: &str = "# OLD CODE HAS BEEN HIDDEN";

// The body may not contain a backtick; a fence ends at the first one.
static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(python|py)[ \t]*\r?\n([^`]*)```").expect("code block regex must compile")
});

/// Body of the first python code block in `content`, if any.
pub fn extract_code_block(content: &str) -> Option<&str> {
    CODE_BLOCK_RE
        .captures(content)
        .and_then(|caps| caps.get(2))
        .map(|body| body.as_str())
}

/// Whether `content` holds a python code block whose body is still visible.
pub fn has_visible_code(content: &str) -> bool {
    CODE_BLOCK_RE
        .captures_iter(content)
        .any(|caps| !is_placeholder(&caps[2]))
}

/// Replace the body of every python code block with [`CODE_PLACEHOLDER`].
///
/// Prose around the fences is kept byte for byte. Blocks that already hold
/// the placeholder are left alone, so the result is a fixed point.
pub fn redact_code_blocks(content: &str) -> Cow<'_, str> {
    if !has_visible_code(content) {
        return Cow::Borrowed(content);
    }
    CODE_BLOCK_RE.replace_all(content, |caps: &Captures<'_>| {
        if is_placeholder(&caps[2]) {
            caps[0].to_string()
        } else {
            format!("```{}\n{CODE_PLACEHOLDER}\n```", &caps[1])
        }
    })
}

fn is_placeholder(body: &str) -> bool {
    body.trim() == CODE_PLACEHOLDER
}
