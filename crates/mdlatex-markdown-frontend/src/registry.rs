//! Inline pattern registry.
//!
//! Each rule is an anchored regular expression plus a constructor that turns
//! its captures into IR nodes. Rules are tried in a fixed priority order at
//! every scan position and the first one that matches wins. Rules that
//! swallow their span are applied to the raw markdown before the markdown
//! inline grammar runs (see [`crate::preprocess`]); the rest run over the
//! text runs of the parsed tree.

use lazy_static::lazy_static;
use mdlatex_ir::{CitationKind, Fraction, GeneratedKind, Inline, MetaKey};
use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    ParenCite,
    TextCite,
    Metadata,
    QuoteMark,
    Generated,
    Literal,
    Package,
    MixedFraction,
    SimpleFraction,
    IndexEntry,
}

/// A match produced by a rule: the nodes replacing the span and its byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMatch {
    pub kind: RuleKind,
    pub nodes: Vec<Inline>,
    pub len: usize,
}

pub type Build = fn(&Captures<'_>) -> Option<Vec<Inline>>;
pub type Guard = fn(&str, usize, usize) -> bool;

pub struct Rule {
    pub kind: RuleKind,
    pub swallows_inner: bool,
    pattern: Regex,
    build: Build,
    guard: Guard,
}

impl Rule {
    /// Panics if `pattern` is not a valid regular expression.
    pub(crate) fn new(
        kind: RuleKind,
        pattern: &str,
        swallows_inner: bool,
        build: Build,
        guard: Guard,
    ) -> Self {
        let anchored = format!("^(?:{})", pattern);
        Self {
            kind,
            swallows_inner,
            pattern: Regex::new(&anchored).expect("inline rule pattern"),
            build,
            guard,
        }
    }

    /// Try this rule at byte offset `pos` of `text`.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<InlineMatch> {
        let caps = self.pattern.captures(&text[pos..])?;
        let len = caps.get(0)?.end();
        if len == 0 || !(self.guard)(text, pos, pos + len) {
            return None;
        }
        let nodes = (self.build)(&caps)?;
        Some(InlineMatch {
            kind: self.kind,
            nodes,
            len,
        })
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern.as_str())
            .field("swallows_inner", &self.swallows_inner)
            .finish()
    }
}

/// Which rules a scan consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Raw markdown, before the markdown inline grammar.
    Swallowing,
    /// Text runs of the parsed tree.
    Text,
    All,
}

impl Phase {
    fn admits(self, rule: &Rule) -> bool {
        match self {
            Phase::Swallowing => rule.swallows_inner,
            Phase::Text => !rule.swallows_inner,
            Phase::All => true,
        }
    }
}

#[derive(Debug)]
pub struct Registry {
    rules: Vec<Rule>,
}

lazy_static! {
    /// The rule set every conversion uses.
    pub static ref STANDARD_REGISTRY: Registry = Registry::standard();
}

const CITE_KEY: &str = r"[A-Z][A-Za-z]+[0-9]{4}";

impl Registry {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            Rule::new(
                RuleKind::ParenCite,
                &format!(r"([ \t]?)\(({})\)", CITE_KEY),
                true,
                |caps| Some(citation(caps, CitationKind::Parenthetical)),
                cite_boundary,
            ),
            Rule::new(
                RuleKind::TextCite,
                &format!(r"([ \t]?)({})", CITE_KEY),
                true,
                |caps| Some(citation(caps, CitationKind::Narrative)),
                |text, start, end| cite_boundary(text, start, end) && !alnum_at(text, end),
            ),
            Rule::new(
                RuleKind::Metadata,
                r"\[([A-Za-z0-9]+):[ \t]*([^\]\n]*)\]",
                true,
                |caps| {
                    let key = caps[1].parse::<MetaKey>().ok()?;
                    Some(vec![Inline::Metadata {
                        key,
                        value: caps[2].trim().to_string(),
                    }])
                },
                always,
            ),
            Rule::new(
                RuleKind::QuoteMark,
                "\"",
                false,
                |_| Some(vec![Inline::QuoteMark]),
                always,
            ),
            Rule::new(
                RuleKind::Generated,
                r"\[([A-Z]+)\]",
                true,
                |caps| Some(vec![Inline::Generated(caps[1].parse::<GeneratedKind>().ok()?)]),
                always,
            ),
            Rule::new(
                RuleKind::Literal,
                r"\[\[(.+?)\]\]",
                true,
                |caps| Some(vec![Inline::Literal(caps[1].to_string())]),
                always,
            ),
            Rule::new(
                RuleKind::Package,
                r"\[Package:[ \t]*([^\]\(\)\s]+)(?:\(([^\)\n]*)\))?\]",
                true,
                |caps| {
                    Some(vec![Inline::Package {
                        name: caps[1].to_string(),
                        options: caps.get(2).map(|m| m.as_str().trim().to_string()),
                    }])
                },
                always,
            ),
            Rule::new(
                RuleKind::MixedFraction,
                r"([0-9]+) ([13])/([24])",
                false,
                |caps| {
                    Some(vec![Inline::Fraction(Fraction {
                        whole: Some(caps[1].parse().ok()?),
                        numerator: caps[2].parse().ok()?,
                        denominator: caps[3].parse().ok()?,
                    })])
                },
                |text, start, end| !digit_before(text, start) && !digit_at(text, end),
            ),
            Rule::new(
                RuleKind::SimpleFraction,
                r"([13])/([24])",
                false,
                |caps| {
                    Some(vec![Inline::Fraction(Fraction {
                        whole: None,
                        numerator: caps[1].parse().ok()?,
                        denominator: caps[2].parse().ok()?,
                    })])
                },
                |text, start, end| {
                    !follows_whole_number(text, start)
                        && !digit_before(text, start)
                        && !digit_at(text, end)
                },
            ),
            Rule::new(
                RuleKind::IndexEntry,
                r"!(\w+)",
                false,
                |caps| Some(vec![Inline::IndexEntry(caps[1].to_string())]),
                always,
            ),
        ])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule at `pos`, in priority order.
    pub fn match_at(&self, text: &str, pos: usize, phase: Phase) -> Option<InlineMatch> {
        self.rules
            .iter()
            .filter(|rule| phase.admits(rule))
            .find_map(|rule| rule.match_at(text, pos))
    }

    /// Split `text` into plain text and rule nodes, scanning left to right.
    pub fn scan(&self, text: &str, phase: Phase) -> Vec<Inline> {
        let mut out = Vec::new();
        let mut plain_start = 0usize;
        let mut pos = 0usize;
        while pos < text.len() {
            if let Some(found) = self.match_at(text, pos, phase) {
                log::debug!("inline rule {:?} matched at {}", found.kind, pos);
                if plain_start < pos {
                    out.push(Inline::text(&text[plain_start..pos]));
                }
                out.extend(found.nodes);
                pos += found.len;
                plain_start = pos;
                continue;
            }
            pos += text[pos..].chars().next().map_or(1, char::len_utf8);
        }
        if plain_start < text.len() {
            out.push(Inline::text(&text[plain_start..]));
        }
        out
    }
}

fn citation(caps: &Captures<'_>, kind: CitationKind) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let lead = &caps[1];
    if !lead.is_empty() {
        nodes.push(Inline::text(lead));
    }
    nodes.push(Inline::Citation {
        kind,
        key: caps[2].to_string(),
    });
    nodes
}

fn always(_: &str, _: usize, _: usize) -> bool {
    true
}

/// A citation needs whitespace in front; the start of the text counts too.
fn cite_boundary(text: &str, start: usize, _end: usize) -> bool {
    let rest = &text[start..];
    if rest.starts_with(' ') || rest.starts_with('\t') {
        return true;
    }
    text[..start]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace)
}

fn digit_before(text: &str, start: usize) -> bool {
    text[..start]
        .chars()
        .next_back()
        .is_some_and(|ch| ch.is_ascii_digit())
}

fn digit_at(text: &str, end: usize) -> bool {
    text[end..].chars().next().is_some_and(|ch| ch.is_ascii_digit())
}

fn alnum_at(text: &str, end: usize) -> bool {
    text[end..]
        .chars()
        .next()
        .is_some_and(char::is_alphanumeric)
}

/// `<digit><space>` immediately before `start`: the fraction belongs to a mixed number.
fn follows_whole_number(text: &str, start: usize) -> bool {
    text[..start].ends_with(' ') && digit_before(text, start - 1)
}
