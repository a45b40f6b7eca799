//! Protection pass over raw markdown.
//!
//! Spans matched by swallowing rules are cut out of the source before
//! pulldown-cmark runs and replaced by an opaque placeholder, so that
//! brackets, emphasis markers and quotes inside them are never seen by the
//! markdown inline grammar. Fenced code blocks and code spans are copied
//! through untouched.

use mdlatex_ir::Inline;

use crate::registry::{Phase, Registry};

pub const PLACEHOLDER_OPEN: char = '\u{E000}';
pub const PLACEHOLDER_CLOSE: char = '\u{E001}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protected {
    /// Source text the placeholder replaced.
    pub raw: String,
    pub nodes: Vec<Inline>,
}

#[derive(Debug, Default)]
pub struct PreprocessResult {
    pub source: String,
    pub protected: Vec<Protected>,
}

impl PreprocessResult {
    /// Placeholder starting at `pos`, with its byte length.
    pub fn lookup(&self, text: &str, pos: usize) -> Option<(&Protected, usize)> {
        let rest = text[pos..].strip_prefix(PLACEHOLDER_OPEN)?;
        let digits = rest.find(PLACEHOLDER_CLOSE)?;
        let idx: usize = rest[..digits].parse().ok()?;
        let entry = self.protected.get(idx)?;
        let len = PLACEHOLDER_OPEN.len_utf8() + digits + PLACEHOLDER_CLOSE.len_utf8();
        Some((entry, len))
    }

    /// Put the raw source text back in place of every placeholder.
    pub fn restore(&self, text: &str) -> String {
        if !text.contains(PLACEHOLDER_OPEN) {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut pos = 0usize;
        while pos < text.len() {
            if let Some((entry, len)) = self.lookup(text, pos) {
                out.push_str(&entry.raw);
                pos += len;
                continue;
            }
            let ch = text[pos..].chars().next().unwrap_or(PLACEHOLDER_OPEN);
            out.push(ch);
            pos += ch.len_utf8();
        }
        out
    }
}

pub fn preprocess_markdown(input: &str, registry: &Registry) -> PreprocessResult {
    let mut result = PreprocessResult {
        source: String::with_capacity(input.len()),
        protected: Vec::new(),
    };
    let mut open_fence: Option<(char, usize)> = None;

    for line in input.split_inclusive('\n') {
        match (open_fence, fence_of(line)) {
            (Some((ch, count)), Some((close_ch, close_count)))
                if ch == close_ch
                    && close_count >= count
                    && line.trim_start().trim_start_matches(ch).trim().is_empty() =>
            {
                open_fence = None;
                result.source.push_str(line);
            }
            (Some(_), _) => result.source.push_str(line),
            (None, Some(fence)) => {
                open_fence = Some(fence);
                result.source.push_str(line);
            }
            (None, None) => protect_line(line, registry, &mut result),
        }
    }

    if !result.protected.is_empty() {
        log::debug!("protected {} inline spans", result.protected.len());
    }
    result
}

fn protect_line(line: &str, registry: &Registry, result: &mut PreprocessResult) {
    let mut plain_start = 0usize;
    let mut pos = 0usize;
    while pos < line.len() {
        let rest = &line[pos..];
        if rest.starts_with('`') {
            let ticks = rest.chars().take_while(|&c| c == '`').count();
            pos += ticks;
            if let Some(close) = find_closing_ticks(&line[pos..], ticks) {
                pos += close + ticks;
            }
            continue;
        }
        if rest.starts_with('\\') {
            pos += 1;
            pos += line[pos..].chars().next().map_or(0, char::len_utf8);
            continue;
        }
        if let Some(found) = registry.match_at(line, pos, Phase::Swallowing) {
            result.source.push_str(&line[plain_start..pos]);
            let idx = result.protected.len();
            result.protected.push(Protected {
                raw: line[pos..pos + found.len].to_string(),
                nodes: found.nodes,
            });
            result.source.push(PLACEHOLDER_OPEN);
            result.source.push_str(&idx.to_string());
            result.source.push(PLACEHOLDER_CLOSE);
            pos += found.len;
            plain_start = pos;
            continue;
        }
        pos += rest.chars().next().map_or(1, char::len_utf8);
    }
    result.source.push_str(&line[plain_start..]);
}

fn fence_of(line: &str) -> Option<(char, usize)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ch = trimmed.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let count = trimmed.chars().take_while(|&c| c == ch).count();
    (count >= 3).then_some((ch, count))
}

/// Offset of a backtick run of exactly `ticks` length.
fn find_closing_ticks(rest: &str, ticks: usize) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i] == b'`' {
            i += 1;
        }
        if i - start == ticks {
            return Some(start);
        }
    }
    None
}
