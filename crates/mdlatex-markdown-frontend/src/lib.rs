//! Markdown to IR frontend.
//!
//! pulldown-cmark supplies the block and inline grammar; the inline pattern
//! registry layers the custom directives on top of it.

use mdlatex_ir::{Alignment, Block, CodeBlock, Document, Image, Inline, ListKind, Loss, Table};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

mod preprocess;
pub mod registry;

pub use preprocess::{preprocess_markdown, PreprocessResult, Protected};
pub use registry::{InlineMatch, Phase, Registry, Rule, RuleKind, STANDARD_REGISTRY};

pub fn markdown_to_ir(input: &str) -> Document {
    markdown_to_ir_with(input, &STANDARD_REGISTRY)
}

pub fn markdown_to_ir_with(input: &str, registry: &Registry) -> Document {
    let pre = preprocess_markdown(input, registry);
    let mut builder = TreeBuilder::new(&pre, registry);
    for event in Parser::new_ext(&pre.source, parser_options()) {
        builder.event(event);
    }
    builder.finish()
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_MATH);
    options
}

enum SpanKind {
    Emph,
    Strong,
    Strikethrough,
    Link(String),
}

enum Frame {
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    Quote(Vec<Block>),
    List {
        kind: ListKind,
        items: Vec<Vec<Block>>,
    },
    Item {
        blocks: Vec<Block>,
        inlines: Vec<Inline>,
    },
    Code {
        language: Option<String>,
        content: String,
    },
    Html(String),
    Table(Table),
    Row {
        head: bool,
        cells: Vec<Vec<Inline>>,
    },
    Cell(Vec<Inline>),
    Span {
        kind: SpanKind,
        inlines: Vec<Inline>,
    },
    Image(Image),
    /// Containers without an IR counterpart; their content goes to the parent.
    Opaque,
}

struct TreeBuilder<'a> {
    pre: &'a PreprocessResult,
    registry: &'a Registry,
    stack: Vec<Frame>,
    blocks: Vec<Block>,
    losses: Vec<Loss>,
}

impl<'a> TreeBuilder<'a> {
    fn new(pre: &'a PreprocessResult, registry: &'a Registry) -> Self {
        Self {
            pre,
            registry,
            stack: Vec::new(),
            blocks: Vec::new(),
            losses: Vec::new(),
        }
    }

    fn finish(mut self) -> Document {
        while !self.stack.is_empty() {
            self.close();
        }
        log::debug!(
            "markdown frontend produced {} blocks, {} losses",
            self.blocks.len(),
            self.losses.len()
        );
        Document::with_losses(self.blocks, self.losses)
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(_) => self.close(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.push_inline(Inline::Code(self.pre.restore(&code))),
            Event::InlineMath(math) => self.push_inline(Inline::Math(self.pre.restore(&math))),
            Event::DisplayMath(math) => {
                self.push_inline(Inline::DisplayMath(self.pre.restore(&math)))
            }
            Event::Html(html) => {
                if let Some(Frame::Html(buf)) = self.stack.last_mut() {
                    buf.push_str(&html);
                } else {
                    self.push_block(Block::Html(html.to_string()));
                }
            }
            Event::InlineHtml(html) => {
                self.losses
                    .push(Loss::new("inline-html", format!("inline HTML `{}` dropped", html)));
                self.push_inline(Inline::RawHtml(html.to_string()));
            }
            Event::FootnoteReference(name) => {
                self.losses.push(Loss::new(
                    "footnote",
                    format!("footnote reference [^{}] is not supported", name),
                ));
            }
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => self.push_block(Block::ThematicBreak),
            Event::TaskListMarker(_) => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading {
                level: level as u8,
                inlines: Vec::new(),
            },
            Tag::BlockQuote(_) => Frame::Quote(Vec::new()),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| self.pre.restore(lang)),
                    CodeBlockKind::Indented => None,
                };
                Frame::Code {
                    language,
                    content: String::new(),
                }
            }
            Tag::HtmlBlock => Frame::Html(String::new()),
            Tag::List(start) => Frame::List {
                kind: start.map_or(ListKind::Unordered, ListKind::Ordered),
                items: Vec::new(),
            },
            Tag::Item => Frame::Item {
                blocks: Vec::new(),
                inlines: Vec::new(),
            },
            Tag::Table(alignments) => Frame::Table(Table {
                alignments: alignments.into_iter().map(convert_alignment).collect(),
                header: Vec::new(),
                rows: Vec::new(),
            }),
            Tag::TableHead => Frame::Row {
                head: true,
                cells: Vec::new(),
            },
            Tag::TableRow => Frame::Row {
                head: false,
                cells: Vec::new(),
            },
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::Emphasis => Frame::Span {
                kind: SpanKind::Emph,
                inlines: Vec::new(),
            },
            Tag::Strong => Frame::Span {
                kind: SpanKind::Strong,
                inlines: Vec::new(),
            },
            Tag::Strikethrough => Frame::Span {
                kind: SpanKind::Strikethrough,
                inlines: Vec::new(),
            },
            Tag::Link { dest_url, .. } => Frame::Span {
                kind: SpanKind::Link(self.pre.restore(&dest_url)),
                inlines: Vec::new(),
            },
            Tag::Image {
                dest_url, title, ..
            } => Frame::Image(Image {
                src: self.pre.restore(&dest_url),
                title: self.pre.restore(&title),
                alt: String::new(),
            }),
            _ => Frame::Opaque,
        };
        self.stack.push(frame);
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame {
            Frame::Paragraph(inlines) => {
                let content = self.expand(inlines);
                self.push_block(Block::Paragraph(content));
            }
            Frame::Heading { level, inlines } => {
                let content = self.expand(inlines);
                self.push_block(Block::Heading { level, content });
            }
            Frame::Quote(blocks) => self.push_block(Block::Quote(blocks)),
            Frame::List { kind, items } => self.push_block(Block::List { kind, items }),
            Frame::Item {
                mut blocks,
                inlines,
            } => {
                if !inlines.is_empty() {
                    blocks.push(Block::Paragraph(self.expand(inlines)));
                }
                match self.stack.last_mut() {
                    Some(Frame::List { items, .. }) => items.push(blocks),
                    _ => {
                        for block in blocks {
                            self.push_block(block);
                        }
                    }
                }
            }
            Frame::Code { language, content } => {
                self.push_block(Block::CodeBlock(CodeBlock { language, content }))
            }
            Frame::Html(html) => {
                self.losses
                    .push(Loss::new("html-block", "HTML block dropped from output"));
                self.push_block(Block::Html(html));
            }
            Frame::Table(table) => self.push_block(Block::Table(table)),
            Frame::Row { head, cells } => {
                if let Some(Frame::Table(table)) = self.stack.last_mut() {
                    if head {
                        table.header = cells;
                    } else {
                        table.rows.push(cells);
                    }
                }
            }
            Frame::Cell(inlines) => {
                let content = self.expand(inlines);
                if let Some(Frame::Row { cells, .. }) = self.stack.last_mut() {
                    cells.push(content);
                }
            }
            Frame::Span { kind, inlines } => {
                let content = self.expand(inlines);
                let inline = match kind {
                    SpanKind::Emph => Inline::Emph(content),
                    SpanKind::Strong => Inline::Strong(content),
                    SpanKind::Strikethrough => Inline::Strikethrough(content),
                    SpanKind::Link(url) => Inline::Link { url, content },
                };
                self.push_inline(inline);
            }
            Frame::Image(image) => self.push_inline(Inline::Image(image)),
            Frame::Opaque => {}
        }
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Frame::Code { content, .. }) => content.push_str(&self.pre.restore(text)),
            Some(Frame::Html(buf)) => buf.push_str(text),
            _ => self.push_inline(Inline::text(text)),
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        for frame in self.stack.iter_mut().rev() {
            let target = match frame {
                Frame::Paragraph(inlines)
                | Frame::Heading { inlines, .. }
                | Frame::Item { inlines, .. }
                | Frame::Cell(inlines)
                | Frame::Span { inlines, .. } => inlines,
                Frame::Image(image) => {
                    if let Inline::Text(text) = &inline {
                        image.alt.push_str(&self.pre.restore(text));
                    }
                    return;
                }
                Frame::Opaque => continue,
                _ => break,
            };
            // Adjacent text events are merged so rules can see the whole run.
            if let Inline::Text(new) = &inline {
                if let Some(Inline::Text(last)) = target.last_mut() {
                    last.push_str(new);
                    return;
                }
            }
            target.push(inline);
            return;
        }
        self.push_block(Block::Paragraph(self.expand(vec![inline])));
    }

    fn push_block(&mut self, block: Block) {
        for idx in (0..self.stack.len()).rev() {
            match &self.stack[idx] {
                Frame::Opaque => continue,
                Frame::Quote(_) | Frame::Item { .. } => {}
                _ => break,
            }
            let pending = match &mut self.stack[idx] {
                Frame::Item { inlines, .. } if !inlines.is_empty() => std::mem::take(inlines),
                _ => Vec::new(),
            };
            let pending = if pending.is_empty() {
                None
            } else {
                Some(Block::Paragraph(self.expand(pending)))
            };
            match &mut self.stack[idx] {
                Frame::Quote(blocks) | Frame::Item { blocks, .. } => {
                    blocks.extend(pending);
                    blocks.push(block);
                }
                _ => unreachable!("checked above"),
            }
            return;
        }
        self.blocks.push(block);
    }

    /// Run the text-phase rules over text runs and splice protected spans back in.
    fn expand(&self, inlines: Vec<Inline>) -> Vec<Inline> {
        let mut out = Vec::with_capacity(inlines.len());
        for inline in inlines {
            match inline {
                Inline::Text(text) => self.scan_text(&text, &mut out),
                other => out.push(other),
            }
        }
        out
    }

    fn scan_text(&self, text: &str, out: &mut Vec<Inline>) {
        let mut plain_start = 0usize;
        let mut pos = 0usize;
        while pos < text.len() {
            if let Some((entry, len)) = self.pre.lookup(text, pos) {
                if plain_start < pos {
                    out.extend(self.registry.scan(&text[plain_start..pos], Phase::Text));
                }
                out.extend(entry.nodes.iter().cloned());
                pos += len;
                plain_start = pos;
                continue;
            }
            pos += text[pos..].chars().next().map_or(1, char::len_utf8);
        }
        if plain_start < text.len() {
            out.extend(self.registry.scan(&text[plain_start..], Phase::Text));
        }
    }
}

fn convert_alignment(alignment: pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}
