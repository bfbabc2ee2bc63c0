//! Built-in markdown renderers for assistant bubbles.
//!
//! Two flavours, one per result shape a host renderer may produce:
//!
//! - [`html_renderer`]: markdown → markup string (pulldown-cmark's HTML writer)
//! - [`tree_renderer`]: markdown → [`RenderNode`] tree, for surfaces that
//!   are not a browser
//!
//! Raw HTML embedded in the markdown is never passed through; it is shown
//! as text.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use crate::core::render::{MarkdownRenderer, RenderNode, Rendered};

fn options() -> Options {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts
}

/// Markdown → HTML string.
pub fn to_html(content: &str) -> String {
    let events = Parser::new_ext(content, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

/// Markdown → element tree rooted at a `div`.
pub fn to_tree(content: &str) -> RenderNode {
    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(content, options()) {
        builder.handle(event);
    }
    builder.finish()
}

pub fn html_renderer() -> MarkdownRenderer {
    MarkdownRenderer::new(|text| Ok(Rendered::Markup(to_html(text))))
}

pub fn tree_renderer() -> MarkdownRenderer {
    MarkdownRenderer::new(|text| Ok(Rendered::Node(to_tree(text))))
}

// ── TreeBuilder ─────────────────────────────────────────────────────────────

/// One open element. `tag: None` means the element is transparent: its
/// children are spliced into the parent when it closes.
struct Frame {
    tag: Option<&'static str>,
    children: Vec<RenderNode>,
    /// Link target, shown after the link text closes.
    suffix: Option<String>,
}

struct TreeBuilder {
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                tag: Some("div"),
                children: Vec::new(),
                suffix: None,
            }],
        }
    }

    fn push_node(&mut self, node: RenderNode) {
        if let Some(frame) = self.stack.last_mut() {
            frame.children.push(node);
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) | Event::Html(t) | Event::InlineHtml(t) => {
                self.push_node(RenderNode::text(t.into_string()))
            }
            Event::Code(c) => self.push_node(RenderNode::element(
                "code",
                vec![RenderNode::text(c.into_string())],
            )),
            Event::SoftBreak => self.push_node(RenderNode::text(" ")),
            Event::HardBreak => self.push_node(RenderNode::element("br", vec![])),
            Event::Rule => self.push_node(RenderNode::element("hr", vec![])),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_node(RenderNode::text(marker));
            }
            _ => {} // footnotes, math
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        let (name, suffix) = match tag {
            Tag::Paragraph => (Some("p"), None),
            Tag::Heading { level, .. } => (Some(heading_tag(level)), None),
            Tag::BlockQuote(_) => (Some("blockquote"), None),
            Tag::CodeBlock(_) => (Some("pre"), None),
            Tag::List(Some(_)) => (Some("ol"), None),
            Tag::List(None) => (Some("ul"), None),
            Tag::Item => (Some("li"), None),
            Tag::Emphasis => (Some("em"), None),
            Tag::Strong => (Some("strong"), None),
            Tag::Strikethrough => (Some("del"), None),
            Tag::Link { dest_url, .. } => {
                let url = dest_url.into_string();
                (Some("a"), (!url.is_empty()).then(|| format!(" ({url})")))
            }
            _ => (None, None),
        };
        self.stack.push(Frame {
            tag: name,
            children: Vec::new(),
            suffix,
        });
    }

    fn close(&mut self, _tag: TagEnd) {
        // The root frame is never closed by an End event
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        match frame.tag {
            Some(tag) => self.push_node(RenderNode::element(tag, frame.children)),
            None => {
                for child in frame.children {
                    self.push_node(child);
                }
            }
        }
        if let Some(suffix) = frame.suffix {
            self.push_node(RenderNode::text(suffix));
        }
    }

    fn finish(mut self) -> RenderNode {
        while self.stack.len() > 1 {
            self.close(TagEnd::Paragraph);
        }
        match self.stack.pop() {
            Some(root) => RenderNode::element("div", root.children),
            None => RenderNode::element("div", vec![]),
        }
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}
