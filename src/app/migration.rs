//! SQL file migration runner.
//!
//! Splits a script into statements and submits them one at a time through a
//! [`SqlExecutor`]. A failing statement is logged and skipped; nothing is
//! rolled back.

use crate::storage::SqlExecutor;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedStatement {
    /// 1-based position in the script.
    pub index: usize,
    pub statement: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationReport {
    pub applied: usize,
    pub failed: Vec<FailedStatement>,
}

impl MigrationReport {
    pub fn total(&self) -> usize {
        self.applied + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

enum State {
    Code,
    /// `escapes` is set for `E'...'` literals, where `\` escapes the next char.
    SingleQuoted { escapes: bool },
    DoubleQuoted,
    LineComment,
    BlockComment(usize),
    DollarQuoted(String),
}

/// Reads a dollar-quote opener (`$$` or `$tag$`) starting at `chars[start]`.
fn dollar_tag(chars: &[char], start: usize) -> Option<String> {
    let mut end = start + 1;
    while end < chars.len() {
        let c = chars[end];
        if c == '$' {
            return Some(chars[start..=end].iter().collect());
        }
        let valid = if end == start + 1 {
            c.is_alphabetic() || c == '_'
        } else {
            c.is_alphanumeric() || c == '_'
        };
        if !valid {
            return None;
        }
        end += 1;
    }
    None
}

/// True when the quote at `chars[quote]` opens an `E'...'` literal.
fn is_escape_prefix(chars: &[char], quote: usize) -> bool {
    if quote == 0 || !matches!(chars[quote - 1], 'E' | 'e') {
        return false;
    }
    match quote.checked_sub(2).map(|p| chars[p]) {
        Some(p) => !(p.is_alphanumeric() || p == '_' || p == '$'),
        None => true,
    }
}

fn starts_with_at(chars: &[char], at: usize, needle: &str) -> bool {
    let mut i = at;
    for n in needle.chars() {
        if chars.get(i) != Some(&n) {
            return false;
        }
        i += 1;
    }
    true
}

/// Splits `sql` on top-level `;`.
///
/// Semicolons inside string literals, quoted identifiers, dollar-quoted
/// bodies and comments do not split. Fragments holding only whitespace and
/// comments are dropped. Returned statements are trimmed and carry no
/// trailing `;`.
pub fn split_statements(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut has_code = false;
    let mut state = State::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match &mut state {
            State::Code => match c {
                ';' => {
                    if has_code {
                        statements.push(current.trim().to_string());
                    }
                    current.clear();
                    has_code = false;
                    i += 1;
                    continue;
                }
                '\'' => {
                    state = State::SingleQuoted {
                        escapes: is_escape_prefix(&chars, i),
                    };
                    has_code = true;
                }
                '"' => {
                    state = State::DoubleQuoted;
                    has_code = true;
                }
                '-' if chars.get(i + 1) == Some(&'-') => {
                    state = State::LineComment;
                    current.push_str("--");
                    i += 2;
                    continue;
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    state = State::BlockComment(1);
                    current.push_str("/*");
                    i += 2;
                    continue;
                }
                '$' => {
                    has_code = true;
                    if let Some(tag) = dollar_tag(&chars, i) {
                        current.push_str(&tag);
                        i += tag.chars().count();
                        state = State::DollarQuoted(tag);
                        continue;
                    }
                }
                c if !c.is_whitespace() => has_code = true,
                _ => {}
            },
            State::SingleQuoted { escapes } => {
                if *escapes && c == '\\' {
                    current.push(c);
                    if let Some(next) = chars.get(i + 1) {
                        current.push(*next);
                    }
                    i += 2;
                    continue;
                }
                if c == '\'' {
                    // '' is an escaped quote
                    if chars.get(i + 1) == Some(&'\'') {
                        current.push_str("''");
                        i += 2;
                        continue;
                    }
                    state = State::Code;
                }
            }
            State::DoubleQuoted => {
                if c == '"' {
                    if chars.get(i + 1) == Some(&'"') {
                        current.push_str("\"\"");
                        i += 2;
                        continue;
                    }
                    state = State::Code;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment(depth) => {
                if c == '*' && chars.get(i + 1) == Some(&'/') {
                    *depth -= 1;
                    if *depth == 0 {
                        state = State::Code;
                    }
                    current.push_str("*/");
                    i += 2;
                    continue;
                }
                if c == '/' && chars.get(i + 1) == Some(&'*') {
                    *depth += 1;
                    current.push_str("/*");
                    i += 2;
                    continue;
                }
            }
            State::DollarQuoted(tag) => {
                if starts_with_at(&chars, i, tag) {
                    current.push_str(tag);
                    i += tag.chars().count();
                    state = State::Code;
                    continue;
                }
            }
        }
        current.push(c);
        i += 1;
    }

    if has_code {
        statements.push(current.trim().to_string());
    }
    statements
}

/// Executes every statement of `sql` in order, continuing past failures.
pub async fn run_migration(executor: &dyn SqlExecutor, sql: &str) -> MigrationReport {
    let statements = split_statements(sql);
    tracing::info!(statements = statements.len(), "Running migration");

    let mut report = MigrationReport::default();
    for (position, statement) in statements.into_iter().enumerate() {
        let index = position + 1;
        match executor.execute_sql(&statement).await {
            Ok(()) => {
                tracing::debug!(index, "Statement applied");
                report.applied += 1;
            }
            Err(e) => {
                tracing::error!(index, error = %e, statement = %statement, "Statement failed, continuing");
                report.failed.push(FailedStatement {
                    index,
                    statement,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(applied = report.applied, failed = report.failed.len(), "Migration finished");
    report
}
