//! Document tree shared by the markdown frontend and the LaTeX backend.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub losses: Vec<Loss>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            losses: Vec::new(),
        }
    }

    pub fn with_losses(blocks: Vec<Block>, losses: Vec<Loss>) -> Self {
        Self { blocks, losses }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading { level: u8, content: Vec<Inline> },
    CodeBlock(CodeBlock),
    List { kind: ListKind, items: Vec<Vec<Block>> },
    Quote(Vec<Block>),
    Table(Table),
    ThematicBreak,
    Html(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// First word of the fence info string, if any.
    pub language: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub header: Vec<Vec<Inline>>,
    pub rows: Vec<Vec<Vec<Inline>>>,
}

impl Table {
    pub fn columns(&self) -> usize {
        self.alignments
            .len()
            .max(self.header.len())
            .max(self.rows.iter().map(Vec::len).max().unwrap_or(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(Vec<Inline>),
    Emph(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Code(String),
    Math(String),
    DisplayMath(String),
    Link { url: String, content: Vec<Inline> },
    Image(Image),
    SoftBreak,
    LineBreak,
    RawHtml(String),
    Citation { kind: CitationKind, key: String },
    Metadata { key: MetaKey, value: String },
    Generated(GeneratedKind),
    Literal(String),
    Package { name: String, options: Option<String> },
    Fraction(Fraction),
    IndexEntry(String),
    QuoteMark,
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub src: String,
    pub title: String,
    pub alt: String,
}

/// Halves, quarters and thirds only: numerator is 1 or 3, denominator 2 or 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub whole: Option<u64>,
    pub numerator: u8,
    pub denominator: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CitationKind {
    /// ` (Key2020)`
    Parenthetical,
    /// ` Key2020`
    Narrative,
}

impl CitationKind {
    pub fn command(self) -> &'static str {
        match self {
            CitationKind::Parenthetical => "parencite",
            CitationKind::Narrative => "textcite",
        }
    }
}

/// Error returned when a name is outside one of the closed vocabularies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName(pub String);

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized name: {}", self.0)
    }
}

impl std::error::Error for UnknownName {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKey {
    Author,
    Date,
    ColorTheme,
    DocType,
    DocOpts,
    H2Level,
    MathPkg,
    SecNumDepth,
    Theme,
    TocDepth,
}

impl MetaKey {
    pub const ALL: [MetaKey; 10] = [
        MetaKey::Author,
        MetaKey::Date,
        MetaKey::ColorTheme,
        MetaKey::DocType,
        MetaKey::DocOpts,
        MetaKey::H2Level,
        MetaKey::MathPkg,
        MetaKey::SecNumDepth,
        MetaKey::Theme,
        MetaKey::TocDepth,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetaKey::Author => "Author",
            MetaKey::Date => "Date",
            MetaKey::ColorTheme => "ColorTheme",
            MetaKey::DocType => "DocType",
            MetaKey::DocOpts => "DocOpts",
            MetaKey::H2Level => "H2Level",
            MetaKey::MathPkg => "MathPkg",
            MetaKey::SecNumDepth => "SecNumDepth",
            MetaKey::Theme => "Theme",
            MetaKey::TocDepth => "TocDepth",
        }
    }
}

impl FromStr for MetaKey {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetaKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

impl fmt::Display for MetaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratedKind {
    Bibliography,
    Figures,
    Index,
    Tables,
    Toc,
}

impl GeneratedKind {
    pub const ALL: [GeneratedKind; 5] = [
        GeneratedKind::Bibliography,
        GeneratedKind::Figures,
        GeneratedKind::Index,
        GeneratedKind::Tables,
        GeneratedKind::Toc,
    ];

    /// Marker spelling inside the brackets, e.g. `[TOC]`.
    pub fn as_str(self) -> &'static str {
        match self {
            GeneratedKind::Bibliography => "BIBLIO",
            GeneratedKind::Figures => "FIGURES",
            GeneratedKind::Index => "INDEX",
            GeneratedKind::Tables => "TABLES",
            GeneratedKind::Toc => "TOC",
        }
    }
}

impl FromStr for GeneratedKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GeneratedKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownName(s.to_string()))
    }
}

impl fmt::Display for GeneratedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markdown the frontend could not represent and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loss {
    pub kind: String,
    pub message: String,
}

impl Loss {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
