//! Second phase: turn the final render state into a complete document.

use std::path::Path;

use lazy_static::lazy_static;
use mdlatex_ir::MetaKey;
use regex::Regex;

use crate::options::RenderOptions;
use crate::paths::derived_path;
use crate::render::escape_latex;
use crate::state::{PackageSet, RenderState};

const STD_PREAMBLE: &str = r"
% Make title and author available
\makeatletter
\let\inserttitle\@title
\let\insertauthor\@author
\makeatother
% Put title and author in header
\pagestyle{fancy}
\fancyhf{}
\lhead{``\inserttitle''}
\rhead{\insertauthor}
\cfoot{\thepage}
\addtolength{\headheight}{2pt} % space for the rule
";

const DOCUMENT_TITLE: &str = "\\maketitle\n";
const SLIDE_TITLE: &str = "\\begin{frame}\n\\titlepage\n\\end{frame}\n";

lazy_static! {
    static ref NAME_WITH_DATE: Regex = Regex::new(r"^(.*) \((.*)\)$").unwrap();
}

/// Resolved document-level values, exposed for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub title: String,
    pub author: String,
    pub date: String,
    pub doc_type: String,
    pub doc_opts: String,
    pub slides: bool,
    pub packages: Vec<String>,
    pub bibliography_sources: Vec<String>,
}

/// Title and date guessed from the source file name, `My_Paper (May 2020).md`
/// style.
#[derive(Debug, Default, PartialEq, Eq)]
struct FilenameDefaults {
    title: Option<String>,
    date: Option<String>,
}

fn filename_defaults(source: Option<&Path>) -> FilenameDefaults {
    let Some(stem) = source.and_then(Path::file_stem).and_then(|s| s.to_str()) else {
        return FilenameDefaults::default();
    };
    let name = stem.replace('_', " ");
    if name.trim().is_empty() {
        return FilenameDefaults::default();
    }
    match NAME_WITH_DATE.captures(&name) {
        Some(caps) => FilenameDefaults {
            title: Some(escape_latex(&caps[1])),
            date: Some(escape_latex(&caps[2])),
        },
        None => FilenameDefaults {
            title: Some(escape_latex(&name)),
            date: None,
        },
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn assemble(
    body: &str,
    state: &RenderState,
    options: &RenderOptions,
) -> (String, DocumentSummary) {
    let defaults = filename_defaults(options.source_path.as_deref());

    let title = state
        .title
        .clone()
        .or(defaults.title)
        .unwrap_or_else(|| options.default_title.clone());
    let date = non_empty(state.metadata(MetaKey::Date))
        .map(str::to_string)
        .or(defaults.date)
        .unwrap_or_else(|| options.today_formatted());
    let author = non_empty(state.metadata(MetaKey::Author))
        .unwrap_or(options.default_author.as_str())
        .to_string();
    let doc_type = non_empty(state.metadata(MetaKey::DocType))
        .unwrap_or(options.default_doc_type.as_str())
        .trim()
        .to_string();
    let doc_opts = state
        .metadata(MetaKey::DocOpts)
        .unwrap_or(options.default_doc_opts.as_str())
        .trim()
        .to_string();

    let bibliography_sources = bibliography_sources(state, options);
    let preamble = preamble(state, &bibliography_sources);
    let packages = packages(state, options);

    let mut abstract_text = state.abstract_text.clone();
    if state.abstract_open {
        abstract_text.push_str("\\end{abstract}\n");
    }

    let mut out = String::new();
    if doc_opts.is_empty() {
        out.push_str(&format!("\\documentclass{{{}}}\n", doc_type));
    } else {
        out.push_str(&format!("\\documentclass[{}]{{{}}}\n", doc_opts, doc_type));
    }
    out.push_str(&format!("\\title{{{}}}\n", title));
    out.push_str(&format!("\\author{{{}}}\n", author));
    out.push_str(&format!("\\date{{{}}}\n", date));
    out.push_str(&packages.render());
    out.push_str(&preamble);
    out.push_str("\\begin{document}\n");
    out.push_str(if state.slide_mode {
        SLIDE_TITLE
    } else {
        DOCUMENT_TITLE
    });
    out.push_str(&abstract_text);
    out.push_str(body);
    out.push_str("\\end{document}\n");

    let summary = DocumentSummary {
        title,
        author,
        date,
        doc_type,
        doc_opts,
        slides: state.slide_mode,
        packages: packages.iter().map(|(name, _)| name.to_string()).collect(),
        bibliography_sources,
    };
    (out, summary)
}

fn bibliography_sources(state: &RenderState, options: &RenderOptions) -> Vec<String> {
    let mut sources = state.bibliography_sources.clone();
    let Some(source) = options.source_path.as_deref() else {
        return sources;
    };
    let sibling = derived_path(source, ".bib");
    if sibling.is_file() {
        if let Some(name) = sibling.file_name().and_then(|n| n.to_str()) {
            if !sources.iter().any(|s| s == name) {
                log::debug!("found sibling bibliography {}", sibling.display());
                sources.push(name.to_string());
            }
        }
    }
    sources
}

fn preamble(state: &RenderState, bibliography_sources: &[String]) -> String {
    let mut out = String::new();
    if state.slide_mode {
        if let Some(theme) = non_empty(state.metadata(MetaKey::Theme)) {
            out.push_str(&format!("\\usetheme{{{}}}\n", theme.trim()));
        }
        if let Some(theme) = non_empty(state.metadata(MetaKey::ColorTheme)) {
            out.push_str(&format!("\\usecolortheme{{{}}}\n", theme.trim()));
        }
    } else {
        out.push_str(STD_PREAMBLE);
    }
    out.push_str(&state.preamble);
    if let Some(depth) = non_empty(state.metadata(MetaKey::SecNumDepth)) {
        out.push_str(&format!("\\setcounter{{secnumdepth}}{{{}}}\n", depth.trim()));
    }
    if let Some(depth) = non_empty(state.metadata(MetaKey::TocDepth)) {
        out.push_str(&format!("\\setcounter{{tocdepth}}{{{}}}\n", depth.trim()));
    }
    for source in bibliography_sources {
        out.push_str(&format!("\\addbibresource{{{}}}\n", source));
    }
    out
}

fn packages(state: &RenderState, options: &RenderOptions) -> PackageSet {
    let mut packages = state.packages.clone();
    if !state.slide_mode {
        packages.require("fancyhdr", "");
    }
    if let Some(math) = state.math_package(options) {
        packages.require(math, "");
    }
    packages
}
