use chrono::NaiveDate;
use mdlatex_ir::{Block, CitationKind, Document, GeneratedKind, Inline, MetaKey};
use mdlatex_latex_backend::{render_document, RenderOptions, WarningKind};
use pretty_assertions::assert_eq;

fn options() -> RenderOptions {
    RenderOptions::default().with_today(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap())
}

fn heading(level: u8, text: &str) -> Block {
    Block::Heading {
        level,
        content: vec![Inline::text(text)],
    }
}

fn cite(kind: CitationKind, key: &str) -> Inline {
    Inline::Citation {
        kind,
        key: key.to_string(),
    }
}

#[test]
fn citations_register_biblatex_once() {
    let doc = Document::new(vec![Block::Paragraph(vec![
        Inline::text("As shown"),
        Inline::text(" "),
        cite(CitationKind::Parenthetical, "Smith2020"),
        Inline::text(" and"),
        Inline::text(" "),
        cite(CitationKind::Narrative, "Jones2019"),
        Inline::text("."),
        Inline::Generated(GeneratedKind::Bibliography),
    ])]);
    let out = render_document(&doc, &options());
    assert!(out
        .latex
        .contains("As shown \\parencite{Smith2020} and \\textcite{Jones2019}.\\printbibliography\n"));
    assert_eq!(out.latex.matches("{biblatex}").count(), 1);
    assert!(out
        .latex
        .contains("\\usepackage[style=authoryear-ibid,backend=biber]{biblatex}\n"));
}

#[test]
fn duplicate_title_is_reported() {
    let doc = Document::new(vec![heading(1, "First"), heading(1, "Second")]);
    let out = render_document(&doc, &options());
    assert_eq!(out.summary.title, "First");
    assert_eq!(out.warnings.len(), 1);
    assert_eq!(out.warnings[0].kind, WarningKind::DuplicateTitle);
    assert!(!out.latex.contains("Second"));
}

#[test]
fn metadata_is_invisible_and_resolved() {
    let doc = Document::new(vec![Block::Paragraph(vec![
        Inline::Metadata {
            key: MetaKey::Author,
            value: "Ada Lovelace".into(),
        },
        Inline::Metadata {
            key: MetaKey::DocOpts,
            value: "12pt".into(),
        },
        Inline::text("Body"),
    ])]);
    let out = render_document(&doc, &options());
    assert!(out.latex.starts_with(
        "\\documentclass[12pt]{article}\n\\title{Untitled}\n\\author{Ada Lovelace}\n\\date{02 January 2020}\n"
    ));
    assert!(out.latex.contains("\\maketitle\n\nBody\n\\end{document}\n"));
    assert_eq!(out.summary.author, "Ada Lovelace");
}

#[test]
fn open_frame_is_closed_before_document_end() {
    let doc = Document::new(vec![
        Block::Paragraph(vec![Inline::Metadata {
            key: MetaKey::DocType,
            value: "beamer".into(),
        }]),
        heading(2, "Only slide"),
        Block::Paragraph(vec![Inline::text("Point")]),
    ]);
    let out = render_document(&doc, &options());
    assert!(out.summary.slides);
    assert!(out.latex.ends_with(
        "\n\\subsection{Only slide}\n\\begin{frame}\n\\frametitle{Only slide}\n\nPoint\n\n\\end{frame}\n\\end{document}\n"
    ));
    assert_eq!(out.latex.matches("\\begin{frame}").count(), 2);
    assert_eq!(out.latex.matches("\\end{frame}").count(), 2);
}

#[test]
fn explicit_package_overrides_automatic_registration() {
    let doc = Document::new(vec![Block::Paragraph(vec![
        Inline::Package {
            name: "graphicx".into(),
            options: Some("draft".into()),
        },
        Inline::Image(mdlatex_ir::Image {
            src: "a.png".into(),
            title: String::new(),
            alt: String::new(),
        }),
        Inline::Package {
            name: "geometry".into(),
            options: None,
        },
    ])]);
    let out = render_document(&doc, &options());
    assert!(out
        .latex
        .contains("\\usepackage[draft]{graphicx}\n\\usepackage{geometry}\n\\usepackage{fancyhdr}\n\\usepackage{amsmath}\n"));
    assert_eq!(
        out.summary.packages,
        vec!["graphicx", "geometry", "fancyhdr", "amsmath"]
    );
}

#[test]
fn bibtex_block_feeds_preamble_and_resources() {
    let doc = Document::new(vec![
        Block::CodeBlock(mdlatex_ir::CodeBlock {
            language: Some("bibtex".into()),
            content: "@misc{Key2000, title={T}}\n".into(),
        }),
        Block::CodeBlock(mdlatex_ir::CodeBlock {
            language: Some("bibtex".into()),
            content: "@misc{Key2001, title={U}}\n".into(),
        }),
    ]);
    let out = render_document(&doc, &RenderOptions::for_source("paper.md"));
    assert_eq!(
        out.summary.bibliography_sources,
        vec!["paper.tmp0.bib", "paper.tmp1.bib"]
    );
    assert!(out.latex.contains(
        "\\begin{filecontents*}{paper.tmp0.bib}\n@misc{Key2000, title={T}}\n\\end{filecontents*}\n"
    ));
    assert!(out
        .latex
        .contains("\\addbibresource{paper.tmp0.bib}\n\\addbibresource{paper.tmp1.bib}\n"));
    assert!(out.latex.contains("\\maketitle\n\\end{document}\n"));
}

#[test]
fn generated_bibliography_uses_bare_file_name() {
    let doc = Document::new(vec![Block::CodeBlock(mdlatex_ir::CodeBlock {
        language: Some("bibtex".into()),
        content: "@misc{Key2000}\n".into(),
    })]);
    let out = render_document(&doc, &RenderOptions::for_source("sub/paper.md"));
    assert_eq!(out.summary.bibliography_sources, vec!["paper.tmp0.bib"]);
    assert!(out.latex.contains("\\begin{filecontents*}{paper.tmp0.bib}\n"));
    assert!(out.latex.contains("\\addbibresource{paper.tmp0.bib}\n"));
    assert!(!out.latex.contains("sub/paper"));
}

#[test]
fn sibling_bibliography_is_registered_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("thesis.md");
    std::fs::write(dir.path().join("thesis.bib"), "@misc{A2000}\n").unwrap();

    let doc = Document::new(vec![Block::Paragraph(vec![Inline::text("x")])]);
    let out = render_document(&doc, &RenderOptions::for_source(&source));
    assert_eq!(out.summary.bibliography_sources, vec!["thesis.bib"]);
    assert_eq!(out.latex.matches("\\addbibresource{thesis.bib}").count(), 1);
    assert_eq!(out.summary.title, "thesis");
}

#[test]
fn missing_sibling_bibliography_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("thesis.md");
    let out = render_document(&Document::default(), &RenderOptions::for_source(&source));
    assert!(out.summary.bibliography_sources.is_empty());
    assert!(!out.latex.contains("\\addbibresource"));
}
