//! mdlatex - Markdown to LaTeX conversion
//!
//! Markdown is parsed into a small document tree (`mdlatex-ir`) with custom
//! inline directives for citations, metadata, generated lists, fractions and
//! packages, then rendered to a complete LaTeX document by
//! `mdlatex-latex-backend`.
//!
//! ```no_run
//! use mdlatex::{markdown_to_latex, RenderOptions};
//!
//! let latex = markdown_to_latex("# Notes\n\nSee (Smith2020).\n", &RenderOptions::default());
//! assert!(latex.contains("\\parencite{Smith2020}"));
//! ```

pub mod driver;
pub mod pipeline;
pub mod utils;

pub use driver::{convert_file, render_file, DriverOptions, DEFAULT_BUILD_COMMAND};
pub use mdlatex_latex_backend::{
    derived_path, escape_latex, DocumentSummary, RenderOptions, RenderWarning, WarningKind,
};
pub use pipeline::{convert_markdown, markdown_to_latex, Conversion};
pub use utils::{ConversionError, ConversionResult, RenderReport};
