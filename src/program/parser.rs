//! Structural splitter for python source.
//!
//! A code block is cut into its top-level statements without executing
//! anything. Each statement becomes a [`Definition`] keyed by the name it
//! binds (functions, classes, plain assignments) or by its normalised text
//! (imports and every other statement). Enough of the lexical structure is
//! tracked (strings, brackets, comments, line continuations, indentation) to
//! reject blocks python itself would refuse to compile for structural reasons.

use std::sync::LazyLock;

use regex::Regex;

use super::store::{Definition, DefinitionKind};
use crate::error::MergeError;

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*(?::[^=]*)?=(?:[^=]|$)")
        .expect("assignment regex must compile")
});

const CONTINUATION_CLAUSES: [&str; 4] = ["else", "elif", "except", "finally"];
const COMPOUND_HEADERS: [&str; 5] = ["if", "for", "while", "try", "async"];

/// Split `source` into top-level definitions, in source order.
///
/// Whitespace- or comment-only input yields an empty list.
pub fn parse_definitions(source: &str) -> Result<Vec<Definition>, MergeError> {
    let lines = logical_lines(source)?;
    let statements = group_statements(lines)?;

    statements
        .into_iter()
        .map(|statement| {
            statement.check_bodies()?;
            statement.into_definition()
        })
        .collect()
}

/// One or more physical lines that python reads as a single line.
#[derive(Debug, Clone)]
struct LogicalLine {
    number: usize,
    text: String,
    indent: usize,
    /// Empty or comment-only.
    blank: bool,
    /// Code on the last physical line, comment stripped.
    code_tail: String,
}

impl LogicalLine {
    fn first_word(&self) -> &str {
        let trimmed = self.text.trim_start();
        let end = trimmed
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(trimmed.len());
        &trimmed[..end]
    }

    fn opens_block(&self) -> bool {
        !self.blank && self.code_tail.ends_with(':')
    }

    fn header_text(&self) -> String {
        self.text.lines().next().unwrap_or_default().trim().to_string()
    }
}

#[derive(Debug)]
struct OpenString {
    quote: char,
    line: usize,
}

/// Lexical state carried from one physical line to the next.
#[derive(Debug, Default)]
struct Scanner {
    brackets: Vec<(char, usize)>,
    open_string: Option<OpenString>,
}

struct ScannedLine<'a> {
    code: &'a str,
    continues: bool,
}

impl Scanner {
    fn is_balanced(&self) -> bool {
        self.brackets.is_empty() && self.open_string.is_none()
    }

    fn scan<'a>(&mut self, line: &'a str, number: usize) -> Result<ScannedLine<'a>, MergeError> {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut code_end = line.len();
        let mut i = 0;

        while i < chars.len() {
            let (pos, c) = chars[i];

            if let Some(quote) = self.open_string.as_ref().map(|open| open.quote) {
                if c == '\\' {
                    i += 2;
                } else if c == quote && is_triple(&chars, i, c) {
                    self.open_string = None;
                    i += 3;
                } else {
                    i += 1;
                }
                continue;
            }

            match c {
                '#' => {
                    code_end = pos;
                    break;
                }
                '\'' | '"' if is_triple(&chars, i, c) => {
                    self.open_string = Some(OpenString {
                        quote: c,
                        line: number,
                    });
                    i += 3;
                    continue;
                }
                '\'' | '"' => {
                    i = skip_short_string(&chars, i + 1, c)
                        .ok_or(MergeError::UnterminatedString { line: number })?;
                    continue;
                }
                '(' | '[' | '{' => self.brackets.push((c, number)),
                ')' | ']' | '}' => match self.brackets.pop() {
                    Some((open, _)) if closes(open) == c => {}
                    _ => {
                        return Err(MergeError::UnmatchedBracket {
                            line: number,
                            bracket: c,
                        })
                    }
                },
                _ => {}
            }
            i += 1;
        }

        let code = &line[..code_end];
        let continues = self.open_string.is_none() && code.trim_end().ends_with('\\');
        Ok(ScannedLine { code, continues })
    }

    fn unclosed_error(&self) -> Option<MergeError> {
        if let Some(open) = &self.open_string {
            return Some(MergeError::UnterminatedString { line: open.line });
        }
        self.brackets
            .last()
            .map(|&(bracket, line)| MergeError::UnclosedBracket { line, bracket })
    }
}

fn is_triple(chars: &[(usize, char)], i: usize, quote: char) -> bool {
    chars.len() >= i + 3 && chars[i..i + 3].iter().all(|&(_, c)| c == quote)
}

/// Index just past the closing quote, or `None` when the line ends first.
fn skip_short_string(chars: &[(usize, char)], mut i: usize, quote: char) -> Option<usize> {
    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn closes(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn logical_lines(source: &str) -> Result<Vec<LogicalLine>, MergeError> {
    let mut scanner = Scanner::default();
    let mut lines = Vec::new();
    let mut current: Option<LogicalLine> = None;

    for (idx, raw) in source.lines().enumerate() {
        let number = idx + 1;
        let scanned = scanner.scan(raw, number)?;
        let code_tail = scanned.code.trim_end().to_string();

        match current.as_mut() {
            Some(line) => {
                line.text.push('\n');
                line.text.push_str(raw);
                line.code_tail = code_tail;
            }
            None => {
                let trimmed = raw.trim_start();
                current = Some(LogicalLine {
                    number,
                    text: raw.to_string(),
                    indent: indent_width(raw),
                    blank: trimmed.is_empty() || trimmed.starts_with('#'),
                    code_tail,
                });
            }
        }

        if scanner.is_balanced() && !scanned.continues {
            lines.extend(current.take());
        }
    }

    if let Some(error) = scanner.unclosed_error() {
        return Err(error);
    }
    lines.extend(current.take());
    Ok(lines)
}

/// A top-level statement with its leading comments/decorators and body.
#[derive(Debug)]
struct RawStatement {
    prefix: Vec<LogicalLine>,
    header: LogicalLine,
    body: Vec<LogicalLine>,
}

impl RawStatement {
    fn is_compound(&self) -> bool {
        COMPOUND_HEADERS.contains(&self.header.first_word())
    }

    fn lines(&self) -> impl Iterator<Item = &LogicalLine> {
        std::iter::once(&self.header).chain(self.body.iter())
    }

    /// Every `:` header needs an indented line after it.
    fn check_bodies(&self) -> Result<(), MergeError> {
        let code: Vec<&LogicalLine> = self.lines().filter(|line| !line.blank).collect();
        for (i, line) in code.iter().enumerate() {
            if !line.opens_block() {
                continue;
            }
            match code.get(i + 1) {
                Some(next) if next.indent > line.indent => {}
                _ => {
                    return Err(MergeError::MissingBody {
                        line: line.number,
                        header: line.header_text(),
                    })
                }
            }
        }
        Ok(())
    }

    fn into_definition(self) -> Result<Definition, MergeError> {
        let (name, kind) = classify(&self.header)?;
        let source = self
            .prefix
            .iter()
            .chain(std::iter::once(&self.header))
            .chain(self.body.iter())
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim_end()
            .to_string();
        Ok(Definition { name, kind, source })
    }
}

fn group_statements(lines: Vec<LogicalLine>) -> Result<Vec<RawStatement>, MergeError> {
    let mut statements: Vec<RawStatement> = Vec::new();
    let mut prefix: Vec<LogicalLine> = Vec::new();
    let mut decorator: Option<usize> = None;

    for line in lines {
        if line.blank {
            let top_level_comment = line.indent == 0 && !line.text.trim().is_empty();
            match statements.last_mut() {
                Some(statement) if prefix.is_empty() && !top_level_comment => {
                    statement.body.push(line)
                }
                _ if prefix.is_empty() && !top_level_comment => {}
                _ => prefix.push(line),
            }
            continue;
        }

        if line.indent > 0 {
            match statements.last_mut() {
                Some(statement) if decorator.is_none() => {
                    statement.body.append(&mut prefix);
                    statement.body.push(line);
                }
                _ => return Err(MergeError::UnexpectedIndent { line: line.number }),
            }
            continue;
        }

        if line.text.starts_with('@') {
            decorator.get_or_insert(line.number);
            prefix.push(line);
            continue;
        }

        let word = line.first_word();
        if CONTINUATION_CLAUSES.contains(&word) {
            if let Some(line) = decorator {
                return Err(MergeError::DanglingDecorator { line });
            }
            match statements.last_mut() {
                Some(statement) if statement.is_compound() => {
                    statement.body.append(&mut prefix);
                    statement.body.push(line);
                }
                _ => {
                    return Err(MergeError::OrphanClause {
                        line: line.number,
                        keyword: word.to_string(),
                    })
                }
            }
            continue;
        }

        if let Some(decorator_line) = decorator.take() {
            if !matches!(word, "def" | "class" | "async") {
                return Err(MergeError::DanglingDecorator {
                    line: decorator_line,
                });
            }
        }

        statements.push(RawStatement {
            prefix: std::mem::take(&mut prefix),
            header: line,
            body: Vec::new(),
        });
    }

    if let Some(line) = decorator {
        return Err(MergeError::DanglingDecorator { line });
    }
    if let Some(last) = statements.last_mut() {
        last.body.append(&mut prefix);
    }
    Ok(statements)
}

fn classify(header: &LogicalLine) -> Result<(String, DefinitionKind), MergeError> {
    let text = header.text.trim_start();
    let line = header.number;

    let def_rest = strip_keyword(text, "async")
        .and_then(|rest| strip_keyword(rest, "def"))
        .or_else(|| strip_keyword(text, "def"));
    if let Some(rest) = def_rest {
        return match leading_identifier(rest) {
            Some((name, after)) if after.trim_start().starts_with('(') => {
                Ok((name.to_string(), DefinitionKind::Function))
            }
            _ => Err(MergeError::InvalidDefinition {
                line,
                keyword: "function",
            }),
        };
    }

    if let Some(rest) = strip_keyword(text, "class") {
        return match leading_identifier(rest) {
            Some((name, after)) if after.trim_start().starts_with(['(', ':']) => {
                Ok((name.to_string(), DefinitionKind::Class))
            }
            _ => Err(MergeError::InvalidDefinition {
                line,
                keyword: "class",
            }),
        };
    }

    if strip_keyword(text, "import").is_some() || strip_keyword(text, "from").is_some() {
        return Ok((normalize_whitespace(text), DefinitionKind::Import));
    }

    if let Some(caps) = ASSIGNMENT_RE.captures(text) {
        return Ok((caps[1].to_string(), DefinitionKind::Variable));
    }

    Ok((
        normalize_whitespace(&header.header_text()),
        DefinitionKind::Statement,
    ))
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    rest.starts_with(char::is_whitespace)
        .then(|| rest.trim_start())
}

fn leading_identifier(text: &str) -> Option<(&str, &str)> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let end = chars
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    Some((&text[..end], &text[end..]))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(source: &str) -> Vec<(String, DefinitionKind)> {
        parse_definitions(source)
            .unwrap()
            .into_iter()
            .map(|d| (d.name, d.kind))
            .collect()
    }

    #[test]
    fn splits_top_level_definitions() {
        let source = "\
import os
from typing import List

LIMIT: int = 10

class Chart(Base):
    def render(self):
        return 1

def main():
    print(Chart().render())

if __name__ == \"__main__\":
    main()
";
        assert_eq!(
            names(source),
            vec![
                ("import os".to_string(), DefinitionKind::Import),
                ("from typing import List".to_string(), DefinitionKind::Import),
                ("LIMIT".to_string(), DefinitionKind::Variable),
                ("Chart".to_string(), DefinitionKind::Class),
                ("main".to_string(), DefinitionKind::Function),
                (
                    "if __name__ == \"__main__\":".to_string(),
                    DefinitionKind::Statement
                ),
            ]
        );
    }

    #[test]
    fn decorators_and_comments_travel_with_the_definition() {
        let source = "# cached lookup\n@lru_cache(maxsize=None)\ndef fib(n):\n    return n\n";
        let defs = parse_definitions(source).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "fib");
        assert_eq!(
            defs[0].source,
            "# cached lookup\n@lru_cache(maxsize=None)\ndef fib(n):\n    return n"
        );
    }

    #[test]
    fn async_def_is_a_function() {
        assert_eq!(
            names("async def fetch(url):\n    return url\n"),
            vec![("fetch".to_string(), DefinitionKind::Function)]
        );
    }

    #[test]
    fn multiline_brackets_and_strings_stay_in_one_statement() {
        let source = "\
QUERY = \"\"\"
def not_a_function():
    pass
\"\"\"
COLORS = [
    'red',  # ) not a bracket
    'blue',
]
";
        assert_eq!(
            names(source),
            vec![
                ("QUERY".to_string(), DefinitionKind::Variable),
                ("COLORS".to_string(), DefinitionKind::Variable),
            ]
        );
    }

    #[test]
    fn else_clauses_attach_to_their_statement() {
        let source = "try:\n    import numpy\nexcept ImportError:\n    numpy = None\n";
        let defs = parse_definitions(source).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].kind, DefinitionKind::Statement);
        assert!(defs[0].source.ends_with("numpy = None"));
    }

    #[test]
    fn comparisons_are_not_assignments() {
        assert_eq!(names("x == 1\n")[0].1, DefinitionKind::Statement);
        assert_eq!(names("x = y == 1\n")[0].1, DefinitionKind::Variable);
    }

    #[test]
    fn blank_input_has_no_definitions() {
        assert!(parse_definitions("\n  \n# just a note\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_unexpected_indent() {
        assert_eq!(
            parse_definitions("    x = 1\n"),
            Err(MergeError::UnexpectedIndent { line: 1 })
        );
    }

    #[test]
    fn rejects_missing_body() {
        assert_eq!(
            parse_definitions("def f():\n\nx = 1\n"),
            Err(MergeError::MissingBody {
                line: 1,
                header: "def f():".to_string()
            })
        );
    }

    #[test]
    fn one_line_body_is_fine() {
        assert_eq!(names("def f(): return 1\n")[0].0, "f");
    }

    #[test]
    fn rejects_unbalanced_brackets() {
        assert_eq!(
            parse_definitions("x = (1,\ny = 2\n"),
            Err(MergeError::UnclosedBracket {
                line: 1,
                bracket: '('
            })
        );
        assert_eq!(
            parse_definitions("x = 1)\n"),
            Err(MergeError::UnmatchedBracket {
                line: 1,
                bracket: ')'
            })
        );
    }

    #[test]
    fn rejects_unterminated_strings() {
        assert_eq!(
            parse_definitions("x = 'abc\n"),
            Err(MergeError::UnterminatedString { line: 1 })
        );
        assert_eq!(
            parse_definitions("x = 1\ndoc = \"\"\"never closed\n"),
            Err(MergeError::UnterminatedString { line: 2 })
        );
    }

    #[test]
    fn rejects_dangling_decorator_and_orphan_else() {
        assert_eq!(
            parse_definitions("@wrap\nx = 1\n"),
            Err(MergeError::DanglingDecorator { line: 1 })
        );
        assert_eq!(
            parse_definitions("x = 1\nelse:\n    pass\n"),
            Err(MergeError::OrphanClause {
                line: 2,
                keyword: "else".to_string()
            })
        );
    }

    #[test]
    fn rejects_nameless_def() {
        assert_eq!(
            parse_definitions("def (x):\n    pass\n"),
            Err(MergeError::InvalidDefinition {
                line: 1,
                keyword: "function"
            })
        );
    }
}
