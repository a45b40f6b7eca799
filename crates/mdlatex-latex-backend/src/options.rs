//! Render configuration.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_AUTHOR: &str = "Anonymous";
pub const DEFAULT_DOC_TYPE: &str = "article";
pub const DEFAULT_DOC_OPTS: &str = "11pt,a4paper";
pub const DEFAULT_MATH_PACKAGE: &str = "amsmath";
pub const DEFAULT_H2_LEVEL: i64 = 2;
pub const DATE_FORMAT: &str = "%d %B %Y";
pub const BIBLATEX_OPTIONS: &str = "style=authoryear-ibid,backend=biber";

/// Document types that switch the renderer into slide mode.
pub const SLIDE_DOC_TYPES: &[&str] = &["beamer"];

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Markdown file being rendered. Drives the title/date defaults and the
    /// paths of generated and sibling bibliography files.
    pub source_path: Option<PathBuf>,
    pub default_title: String,
    pub default_author: String,
    pub default_doc_type: String,
    pub default_doc_opts: String,
    pub default_math_package: String,
    /// Sectioning depth a level-2 heading maps to.
    pub default_h2_level: i64,
    /// strftime format for the derived date.
    pub date_format: String,
    pub biblatex_options: String,
    /// Fixed render date; `None` uses the local date.
    pub today: Option<NaiveDate>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            source_path: None,
            default_title: DEFAULT_TITLE.to_string(),
            default_author: DEFAULT_AUTHOR.to_string(),
            default_doc_type: DEFAULT_DOC_TYPE.to_string(),
            default_doc_opts: DEFAULT_DOC_OPTS.to_string(),
            default_math_package: DEFAULT_MATH_PACKAGE.to_string(),
            default_h2_level: DEFAULT_H2_LEVEL,
            date_format: DATE_FORMAT.to_string(),
            biblatex_options: BIBLATEX_OPTIONS.to_string(),
            today: None,
        }
    }
}

impl RenderOptions {
    pub fn for_source(path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn source(&self) -> &Path {
        self.source_path
            .as_deref()
            .unwrap_or_else(|| Path::new("document.md"))
    }

    pub fn today_formatted(&self) -> String {
        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        today.format(&self.date_format).to_string()
    }
}
