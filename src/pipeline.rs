//! IR-based Markdown → LaTeX pipeline.

use mdlatex_ir::{Document, Loss};
use mdlatex_latex_backend::{render_document, DocumentSummary, RenderOptions, RenderWarning};
use mdlatex_markdown_frontend::markdown_to_ir;

/// Everything produced by one conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub latex: String,
    pub summary: DocumentSummary,
    pub warnings: Vec<RenderWarning>,
    /// Markdown constructs with no LaTeX rendering.
    pub losses: Vec<Loss>,
}

pub fn convert_markdown(input: &str, options: &RenderOptions) -> Conversion {
    let doc: Document = markdown_to_ir(input);
    for loss in &doc.losses {
        log::debug!("{}: {}", loss.kind, loss.message);
    }
    let rendered = render_document(&doc, options);
    Conversion {
        latex: rendered.latex,
        summary: rendered.summary,
        warnings: rendered.warnings,
        losses: doc.losses,
    }
}

/// Convert Markdown source to a complete LaTeX document.
pub fn markdown_to_latex(input: &str, options: &RenderOptions) -> String {
    convert_markdown(input, options).latex
}
