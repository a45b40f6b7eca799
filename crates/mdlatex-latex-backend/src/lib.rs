//! IR to LaTeX backend.
//!
//! Rendering runs in two phases. The walk produces the body and mutates a
//! [`RenderState`]; assembly then reads that state to build the packages,
//! preamble and title block that precede the body.

use mdlatex_ir::Document;

mod assemble;
pub mod options;
pub mod paths;
mod render;
pub mod state;

pub use assemble::DocumentSummary;
pub use options::RenderOptions;
pub use paths::derived_path;
pub use state::{PackageSet, RenderState, RenderWarning, WarningKind};

#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub latex: String,
    pub summary: DocumentSummary,
    pub warnings: Vec<RenderWarning>,
}

pub fn render_document(doc: &Document, options: &RenderOptions) -> RenderOutput {
    let mut state = RenderState::new();
    let mut body = render::Walker::new(options).blocks(&doc.blocks, &mut state);
    if state.frame_open {
        body.push_str("\n\\end{frame}\n");
        state.frame_open = false;
    }
    log::debug!(
        "walk finished: {} packages, {} bibliography sources, {} warnings",
        state.packages.len(),
        state.bibliography_sources.len(),
        state.warnings.len()
    );

    let (latex, summary) = assemble::assemble(&body, &state, options);
    RenderOutput {
        latex,
        summary,
        warnings: state.warnings,
    }
}

/// Escape LaTeX special characters in plain text.
pub fn escape_latex(input: &str) -> String {
    render::escape_latex(input)
}
