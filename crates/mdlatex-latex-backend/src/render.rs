//! Tree walk: one LaTeX fragment per node, with side effects on [`RenderState`].

use lazy_static::lazy_static;
use mdlatex_ir::{
    Alignment, Block, CodeBlock, Fraction, GeneratedKind, Image, Inline, ListKind, Table,
};
use phf::phf_map;
use regex::Regex;

use crate::options::RenderOptions;
use crate::paths::derived_path;
use crate::state::{RenderState, WarningKind};

const DOC_LEVELS: [&str; 5] = ["part", "chapter", "section", "subsection", "subsubsection"];
const SLIDE_LEVELS: [&str; 3] = ["section", "frametitle", "framesubtitle"];

/// Heading texts that switch document matter instead of opening a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StructuralSection {
    Frontmatter,
    Mainmatter,
    Backmatter,
    Appendix,
}

impl StructuralSection {
    fn directive(self) -> &'static str {
        match self {
            StructuralSection::Frontmatter => "\n\\thispagestyle{empty}\n\\frontmatter\n",
            StructuralSection::Mainmatter => "\n\\mainmatter\n",
            StructuralSection::Backmatter => "\n\\backmatter\n",
            StructuralSection::Appendix => "\n\\appendix\n",
        }
    }
}

static STRUCTURAL_SECTIONS: phf::Map<&'static str, StructuralSection> = phf_map! {
    "FRONTMATTER" => StructuralSection::Frontmatter,
    "MAINMATTER" => StructuralSection::Mainmatter,
    "BACKMATTER" => StructuralSection::Backmatter,
    "APPENDIX" => StructuralSection::Appendix,
    "APPENDICES" => StructuralSection::Appendix,
};

const ABSTRACT_HEADING: &str = "ABSTRACT";

lazy_static! {
    static ref CAPTION_PREFIX: Regex = Regex::new(r"(?is)^(figure|table):\s*(.+)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Float {
    Figure,
    Table,
}

impl Float {
    fn env(self) -> &'static str {
        match self {
            Float::Figure => "figure",
            Float::Table => "table",
        }
    }
}

pub(crate) struct Walker<'a> {
    options: &'a RenderOptions,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(options: &'a RenderOptions) -> Self {
        Self { options }
    }

    pub(crate) fn blocks(&self, blocks: &[Block], state: &mut RenderState) -> String {
        let mut out = String::new();
        for block in blocks {
            out.push_str(&self.block(block, state, true));
        }
        out
    }

    fn nested_blocks(&self, blocks: &[Block], state: &mut RenderState) -> String {
        let mut out = String::new();
        for block in blocks {
            out.push_str(&self.block(block, state, false));
        }
        out
    }

    fn block(&self, block: &Block, state: &mut RenderState, top_level: bool) -> String {
        match block {
            Block::Paragraph(inlines) => {
                let rendered = format!("\n{}\n", self.inlines(inlines, state));
                if top_level && state.abstract_open {
                    state.abstract_text.push_str(&rendered);
                    return String::new();
                }
                rendered
            }
            Block::Heading { level, content } => self.heading(*level, content, state),
            Block::CodeBlock(code) => self.code_block(code, state),
            Block::List { kind, items } => self.list(*kind, items, state),
            Block::Quote(blocks) => {
                state.packages.require("csquotes", "");
                format!(
                    "\\begin{{displayquote}}\n{}\\end{{displayquote}}\n",
                    self.nested_blocks(blocks, state)
                )
            }
            Block::Table(table) => self.table(table, state),
            Block::ThematicBreak => "\\pagebreak\n".to_string(),
            Block::Html(_) => String::new(),
        }
    }

    fn heading(&self, level: u8, content: &[Inline], state: &mut RenderState) -> String {
        let inner = self.inlines(content, state);

        if !state.slide_mode {
            let key = inner.trim().to_uppercase();
            if key == ABSTRACT_HEADING {
                state.open_abstract();
                return String::new();
            }
            state.close_abstract();
            if let Some(section) = STRUCTURAL_SECTIONS.get(key.as_str()) {
                return section.directive().to_string();
            }
        }

        if let Some(caps) = CAPTION_PREFIX.captures(inner.trim()) {
            log::debug!("pending caption: {}", &caps[2]);
            state.pending_caption = Some(caps[2].to_string());
            return String::new();
        }

        if level == 1 {
            if state.title.is_some() {
                state.warn(
                    WarningKind::DuplicateTitle,
                    format!(
                        "Multiple top-level headings; ignoring all but first (dropped `{}`)",
                        inner
                    ),
                );
            } else {
                state.title = Some(inner);
            }
            return String::new();
        }

        let depth = i64::from(level)
            .saturating_add(state.h2_level(self.options))
            .saturating_sub(2);
        if state.slide_mode {
            return slide_heading(depth, &inner, state);
        }
        let command = DOC_LEVELS[clamp_index(depth, DOC_LEVELS.len())];
        format!("\n\\{}{{{}}}\n", command, inner)
    }

    fn code_block(&self, code: &CodeBlock, state: &mut RenderState) -> String {
        let language = code.language.as_deref().unwrap_or("");
        let lowered = language.to_lowercase();
        match lowered.as_str() {
            "bibtex" => {
                let suffix = format!(".tmp{}.bib", state.bibliography_sources.len());
                // The build runs next to the .tex file, so only the file name is kept.
                let derived = derived_path(self.options.source(), &suffix);
                let path = derived
                    .file_name()
                    .unwrap_or(derived.as_os_str())
                    .to_string_lossy()
                    .into_owned();
                state.preamble.push_str(&file_contents(&path, &code.content));
                state.bibliography_sources.push(path);
                String::new()
            }
            "inlinelatex" => code.content.clone(),
            "preamblelatex" => {
                state.preamble.push_str(&code.content);
                String::new()
            }
            _ if lowered.starts_with("csv!") => {
                let path = &language["csv!".len()..];
                state.preamble.push_str(&file_contents(path, &code.content));
                String::new()
            }
            _ => {
                state.packages.require("listings", "");
                let options = if language.is_empty() {
                    String::new()
                } else {
                    format!("[language={}]", language)
                };
                format!(
                    "\n\\begin{{lstlisting}}{}\n{}\\end{{lstlisting}}\n",
                    options, code.content
                )
            }
        }
    }

    fn list(&self, kind: ListKind, items: &[Vec<Block>], state: &mut RenderState) -> String {
        let env = match kind {
            ListKind::Unordered => "itemize",
            ListKind::Ordered(_) => "enumerate",
        };
        let mut out = format!("\\begin{{{}}}\n", env);
        if let ListKind::Ordered(start) = kind {
            if start > 1 {
                out.push_str(&format!("\\setcounter{{enumi}}{{{}}}\n", start - 1));
            }
        }
        for item in items {
            out.push_str("\\item ");
            out.push_str(self.nested_blocks(item, state).trim());
            out.push('\n');
        }
        out.push_str(&format!("\\end{{{}}}\n", env));
        out
    }

    fn table(&self, table: &Table, state: &mut RenderState) -> String {
        // The table node precedes its cells in walk order, so it claims the caption first.
        let caption = state.pending_caption.take();
        let columns = table.columns();
        let column_spec: Vec<&str> = (0..columns)
            .map(|idx| match table.alignments.get(idx) {
                Some(Alignment::Center) => "c",
                Some(Alignment::Right) => "r",
                _ => "l",
            })
            .collect();

        let mut tabular = format!("\\begin{{tabular}}{{{}}}\n", column_spec.join(" "));
        if !table.header.is_empty() {
            tabular.push_str(&self.table_row(&table.header, state));
            tabular.push_str("\\hline\n");
        }
        for row in &table.rows {
            tabular.push_str(&self.table_row(row, state));
        }
        tabular.push_str("\\end{tabular}\n");

        match caption {
            Some(caption) => float(Float::Table, &tabular, &caption),
            None => format!("\n{}", tabular),
        }
    }

    fn table_row(&self, cells: &[Vec<Inline>], state: &mut RenderState) -> String {
        let rendered: Vec<String> = cells
            .iter()
            .map(|cell| self.inlines(cell, state))
            .collect();
        format!("{} \\\\\n", rendered.join(" & "))
    }

    fn image(&self, image: &Image, state: &mut RenderState) -> String {
        let (basic, kind) = if is_data_file(&image.src) {
            state.packages.set("csvsimple", "l3");
            (format!("\\csvautotabular{{{}}}\n", image.src), Float::Table)
        } else {
            state.packages.require("graphicx", "");
            (format!("\n\\includegraphics{{{}}}\n", image.src), Float::Figure)
        };
        let caption = state.pending_caption.take().or_else(|| {
            let title = image.title.trim();
            (!title.is_empty()).then(|| escape_latex(title))
        });
        match caption {
            Some(caption) => float(kind, &basic, &caption),
            None if kind == Float::Table => format!("\\medskip\n{}", basic),
            None => basic,
        }
    }

    pub(crate) fn inlines(&self, inlines: &[Inline], state: &mut RenderState) -> String {
        let mut out = String::new();
        for inline in inlines {
            out.push_str(&self.inline(inline, state));
        }
        out
    }

    fn inline(&self, inline: &Inline, state: &mut RenderState) -> String {
        match inline {
            Inline::Text(text) => escape_latex(text),
            Inline::Strong(inner) => format!("\\textbf{{{}}}", self.inlines(inner, state)),
            Inline::Emph(inner) => format!("\\textit{{{}}}", self.inlines(inner, state)),
            Inline::Strikethrough(inner) => {
                state.packages.require("ulem", "normalem");
                format!("\\sout{{{}}}", self.inlines(inner, state))
            }
            Inline::Code(code) => format!("\\texttt{{{}}}", escape_latex(code)),
            Inline::Math(math) => {
                self.require_math(state);
                format!("${}$", math)
            }
            Inline::DisplayMath(math) => {
                self.require_math(state);
                format!("\n\\[\n{}\n\\]\n", math.trim())
            }
            Inline::Link { url, content } => {
                state.packages.require("hyperref", "");
                format!("\\href{{{}}}{{{}}}", url, self.inlines(content, state))
            }
            Inline::Image(image) => self.image(image, state),
            Inline::SoftBreak => "\n".to_string(),
            Inline::LineBreak => "\\\\\n".to_string(),
            Inline::RawHtml(_) => String::new(),
            Inline::Citation { kind, key } => {
                state
                    .packages
                    .require("biblatex", &self.options.biblatex_options);
                format!("\\{}{{{}}}", kind.command(), key)
            }
            Inline::Metadata { key, value } => {
                state.set_metadata(*key, value);
                String::new()
            }
            Inline::Generated(kind) => self.generated(*kind, state),
            Inline::Literal(raw) => raw.clone(),
            Inline::Package { name, options } => {
                state.packages.set(name, options.as_deref().unwrap_or(""));
                String::new()
            }
            Inline::Fraction(fraction) => render_fraction(fraction),
            Inline::IndexEntry(term) => {
                state.packages.require("makeidx", "");
                let term = escape_latex(term);
                format!("{}\\index{{{}}}", term, term)
            }
            Inline::QuoteMark => {
                if state.toggle_quote() {
                    "``".to_string()
                } else {
                    "''".to_string()
                }
            }
        }
    }

    fn generated(&self, kind: GeneratedKind, state: &mut RenderState) -> String {
        match kind {
            GeneratedKind::Bibliography => {
                state
                    .packages
                    .require("biblatex", &self.options.biblatex_options);
                "\\printbibliography\n".to_string()
            }
            GeneratedKind::Figures => "\\listoffigures\n".to_string(),
            GeneratedKind::Index => {
                state.packages.require("makeidx", "");
                state.preamble.push_str("\\makeindex\n");
                "\\printindex\n".to_string()
            }
            GeneratedKind::Tables => "\\listoftables\n".to_string(),
            GeneratedKind::Toc => "\\tableofcontents\n".to_string(),
        }
    }

    fn require_math(&self, state: &mut RenderState) {
        if let Some(package) = state.math_package(self.options).map(str::to_string) {
            state.packages.require(&package, "");
        }
    }
}

fn slide_heading(depth: i64, inner: &str, state: &mut RenderState) -> String {
    let command = SLIDE_LEVELS[clamp_index(depth.saturating_sub(1), SLIDE_LEVELS.len())];
    let mut out = String::new();
    if state.frame_open && command != "framesubtitle" {
        out.push_str("\n\\end{frame}");
        state.frame_open = false;
    }
    if command == "frametitle" {
        out.push_str(&format!("\n\\subsection{{{}}}\n\\begin{{frame}}", inner));
        state.frame_open = true;
    }
    out.push_str(&format!("\n\\{}{{{}}}\n", command, inner));
    out
}

fn clamp_index(depth: i64, len: usize) -> usize {
    depth.clamp(0, len as i64 - 1) as usize
}

fn float(kind: Float, body: &str, caption: &str) -> String {
    format!(
        "\n\\begin{{{env}}}[h]\n\\centering\n{body}\\caption{{{caption}}}\n\\end{{{env}}}\n",
        env = kind.env(),
        body = body,
        caption = caption
    )
}

fn file_contents(path: &str, content: &str) -> String {
    let mut out = format!("\\begin{{filecontents*}}{{{}}}\n", path);
    out.push_str(content);
    if !content.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("\\end{filecontents*}\n");
    out
}

fn is_data_file(src: &str) -> bool {
    src.to_lowercase().ends_with(".csv")
}

fn render_fraction(fraction: &Fraction) -> String {
    match fraction.whole {
        Some(whole) => format!(
            "${}\\frac{{{}}}{{{}}}$",
            whole, fraction.numerator, fraction.denominator
        ),
        None => format!(
            "$\\frac{{{}}}{{{}}}$",
            fraction.numerator, fraction.denominator
        ),
    }
}

pub(crate) fn escape_latex(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '$' => out.push_str("\\$"),
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '#' => out.push_str("\\#"),
            '_' => out.push_str("\\_"),
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdlatex_ir::{CitationKind, MetaKey};
    use pretty_assertions::assert_eq;

    fn heading(level: u8, text: &str) -> Block {
        Block::Heading {
            level,
            content: vec![Inline::text(text)],
        }
    }

    fn walk(blocks: &[Block], state: &mut RenderState) -> String {
        let options = RenderOptions::default();
        Walker::new(&options).blocks(blocks, state)
    }

    #[test]
    fn heading_levels_follow_offset_and_clamp() {
        let mut state = RenderState::new();
        assert_eq!(walk(&[heading(2, "Intro")], &mut state), "\n\\section{Intro}\n");
        assert_eq!(
            walk(&[heading(6, "Deep")], &mut state),
            "\n\\subsubsection{Deep}\n"
        );
        state.set_metadata(MetaKey::H2Level, "0");
        assert_eq!(walk(&[heading(2, "Top")], &mut state), "\n\\part{Top}\n");
        state.set_metadata(MetaKey::H2Level, "-3");
        assert_eq!(walk(&[heading(3, "Low")], &mut state), "\n\\part{Low}\n");
    }

    #[test]
    fn extreme_h2_levels_clamp_without_overflow() {
        let mut state = RenderState::new();
        state.set_metadata(MetaKey::H2Level, &i64::MAX.to_string());
        assert_eq!(
            walk(&[heading(2, "High")], &mut state),
            "\n\\subsubsection{High}\n"
        );
        state.set_metadata(MetaKey::H2Level, &i64::MIN.to_string());
        assert_eq!(walk(&[heading(2, "Low")], &mut state), "\n\\part{Low}\n");
        assert!(state.warnings.is_empty());
    }

    #[test]
    fn extreme_h2_levels_clamp_in_slide_mode() {
        let mut state = RenderState::new();
        state.set_metadata(MetaKey::DocType, "beamer");
        state.set_metadata(MetaKey::H2Level, &i64::MIN.to_string());
        assert_eq!(walk(&[heading(2, "Low")], &mut state), "\n\\section{Low}\n");
        state.set_metadata(MetaKey::H2Level, &i64::MAX.to_string());
        assert_eq!(
            walk(&[heading(6, "High")], &mut state),
            "\n\\framesubtitle{High}\n"
        );
        assert!(!state.frame_open);
    }

    #[test]
    fn first_top_level_heading_is_title() {
        let mut state = RenderState::new();
        let out = walk(&[heading(1, "Paper"), heading(1, "Other")], &mut state);
        assert_eq!(out, "");
        assert_eq!(state.title.as_deref(), Some("Paper"));
        assert_eq!(state.warnings.len(), 1);
        assert_eq!(state.warnings[0].kind, WarningKind::DuplicateTitle);
    }

    #[test]
    fn abstract_collects_paragraphs_until_next_heading() {
        let mut state = RenderState::new();
        let out = walk(
            &[
                heading(2, "abstract"),
                Block::Paragraph(vec![Inline::text("Summary.")]),
                heading(2, "Body"),
                Block::Paragraph(vec![Inline::text("Text.")]),
            ],
            &mut state,
        );
        assert_eq!(out, "\n\\section{Body}\n\nText.\n");
        assert_eq!(
            state.abstract_text,
            "\\begin{abstract}\n\nSummary.\n\\end{abstract}\n"
        );
        assert!(!state.abstract_open);
    }

    #[test]
    fn structural_keywords_emit_directives() {
        let mut state = RenderState::new();
        let out = walk(
            &[heading(2, "Frontmatter"), heading(3, "Appendices")],
            &mut state,
        );
        assert_eq!(
            out,
            "\n\\thispagestyle{empty}\n\\frontmatter\n\n\\appendix\n"
        );
    }

    #[test]
    fn slide_mode_skips_special_sections_and_manages_frames() {
        let mut state = RenderState::new();
        state.set_metadata(MetaKey::DocType, "beamer");
        let out = walk(
            &[
                heading(2, "Abstract"),
                heading(3, "Detail"),
                heading(2, "Next"),
            ],
            &mut state,
        );
        assert_eq!(
            out,
            "\n\\subsection{Abstract}\n\\begin{frame}\n\\frametitle{Abstract}\n\
             \n\\framesubtitle{Detail}\n\
             \n\\end{frame}\n\\subsection{Next}\n\\begin{frame}\n\\frametitle{Next}\n"
        );
        assert!(state.frame_open);
        assert!(!state.abstract_open);
    }

    #[test]
    fn slide_section_heading_closes_frame() {
        let mut state = RenderState::new();
        state.set_metadata(MetaKey::DocType, "beamer");
        state.set_metadata(MetaKey::H2Level, "1");
        let out = walk(&[heading(3, "Slide"), heading(2, "Part")], &mut state);
        assert_eq!(
            out,
            "\n\\subsection{Slide}\n\\begin{frame}\n\\frametitle{Slide}\n\
             \n\\end{frame}\n\\section{Part}\n"
        );
        assert!(!state.frame_open);
    }

    #[test]
    fn caption_wraps_next_image() {
        let mut state = RenderState::new();
        let image = Block::Paragraph(vec![Inline::Image(Image {
            src: "chart.png".into(),
            title: String::new(),
            alt: "chart".into(),
        })]);
        let out = walk(&[heading(2, "Figure: Annual Revenue"), image], &mut state);
        assert_eq!(
            out,
            "\n\n\\begin{figure}[h]\n\\centering\n\n\\includegraphics{chart.png}\n\
             \\caption{Annual Revenue}\n\\end{figure}\n\n"
        );
        assert!(state.pending_caption.is_none());
        assert!(state.packages.contains("graphicx"));
    }

    #[test]
    fn uncaptioned_data_image_gets_vertical_space() {
        let mut state = RenderState::new();
        let out = walk(
            &[Block::Paragraph(vec![Inline::Image(Image {
                src: "data.csv".into(),
                title: String::new(),
                alt: String::new(),
            })])],
            &mut state,
        );
        assert_eq!(out, "\n\\medskip\n\\csvautotabular{data.csv}\n\n");
        assert_eq!(state.packages.options("csvsimple"), Some("l3"));
    }

    #[test]
    fn table_claims_caption_and_uncaptioned_table_is_bare() {
        let table = Table {
            alignments: vec![Alignment::Left, Alignment::Right],
            header: vec![vec![Inline::text("Year")], vec![Inline::text("Total")]],
            rows: vec![vec![vec![Inline::text("2020")], vec![Inline::text("5")]]],
        };
        let mut state = RenderState::new();
        let bare = walk(&[Block::Table(table.clone())], &mut state);
        assert_eq!(
            bare,
            "\n\\begin{tabular}{l r}\nYear & Total \\\\\n\\hline\n2020 & 5 \\\\\n\\end{tabular}\n"
        );
        let captioned = walk(&[heading(2, "table: Totals"), Block::Table(table)], &mut state);
        assert!(captioned.starts_with("\n\\begin{table}[h]\n\\centering\n\\begin{tabular}"));
        assert!(captioned.ends_with("\\caption{Totals}\n\\end{table}\n"));
    }

    #[test]
    fn code_block_languages_dispatch() {
        let mut state = RenderState::new();
        let block = |language: &str, content: &str| {
            Block::CodeBlock(CodeBlock {
                language: Some(language.to_string()),
                content: content.to_string(),
            })
        };
        let out = walk(
            &[
                block("InlineLaTeX", "\\vspace{1em}\n"),
                block("preamblelatex", "\\usetikzlibrary{arrows}\n"),
                block("BibTeX", "@book{Foo2020, title={X}}\n"),
                block("csv!data.csv", "a,b\n1,2\n"),
                block("rust", "fn main() {}\n"),
            ],
            &mut state,
        );
        assert_eq!(
            out,
            "\\vspace{1em}\n\n\\begin{lstlisting}[language=rust]\nfn main() {}\n\\end{lstlisting}\n"
        );
        assert_eq!(state.bibliography_sources, vec!["document.tmp0.bib".to_string()]);
        assert_eq!(
            state.preamble,
            "\\usetikzlibrary{arrows}\n\
             \\begin{filecontents*}{document.tmp0.bib}\n@book{Foo2020, title={X}}\n\\end{filecontents*}\n\
             \\begin{filecontents*}{data.csv}\na,b\n1,2\n\\end{filecontents*}\n"
        );
    }

    #[test]
    fn extension_inlines_render() {
        let mut state = RenderState::new();
        let out = walk(
            &[Block::Paragraph(vec![
                Inline::Citation {
                    kind: CitationKind::Narrative,
                    key: "Foo2020".into(),
                },
                Inline::Fraction(Fraction {
                    whole: Some(3),
                    numerator: 1,
                    denominator: 2,
                }),
                Inline::IndexEntry("Rust".into()),
                Inline::Literal("\\LaTeX{}".into()),
                Inline::Generated(GeneratedKind::Index),
            ])],
            &mut state,
        );
        assert_eq!(
            out,
            "\n\\textcite{Foo2020}$3\\frac{1}{2}$Rust\\index{Rust}\\LaTeX{}\\printindex\n\n"
        );
        assert!(state.packages.contains("biblatex"));
        assert!(state.packages.contains("makeidx"));
        assert_eq!(state.preamble, "\\makeindex\n");
    }

    #[test]
    fn quote_marks_pair_positionally() {
        let mut state = RenderState::new();
        let para = |n: usize| Block::Paragraph(vec![Inline::QuoteMark; n]);
        assert_eq!(walk(&[para(4)], &mut state), "\n``''``''\n");
        assert_eq!(walk(&[para(3)], &mut state), "\n``''``\n");
        assert!(state.quote_open);
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape_latex("50% & $5_x#"), "50\\% \\& \\$5\\_x\\#");
    }
}
