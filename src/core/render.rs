//! # Bubble Rendering
//!
//! Turns the message store into the list of bubbles a surface displays.
//! Rendering is a pure function of the messages, so rendering the same store
//! twice yields the same bubbles in the same order.
//!
//! Assistant content may go through a host-supplied renderer, which returns
//! either markup or a node tree. Whatever the renderer does, including
//! panicking, the widget keeps working: any failure falls back to the raw
//! text.

use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::warn;

use crate::core::message::{Message, MessageId};
use crate::transport::Role;

/// Error type a host renderer may return.
pub type RenderError = Box<dyn std::error::Error + Send + Sync>;

/// What a host renderer produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Markup inserted as-is.
    Markup(String),
    /// A node tree attached as a child of the bubble.
    Node(RenderNode),
}

/// A minimal element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Text(String),
    Element {
        tag: String,
        children: Vec<RenderNode>,
    },
}

impl RenderNode {
    pub fn text(text: impl Into<String>) -> Self {
        RenderNode::Text(text.into())
    }

    pub fn element(tag: impl Into<String>, children: Vec<RenderNode>) -> Self {
        RenderNode::Element {
            tag: tag.into(),
            children,
        }
    }

    /// Serializes the tree; text is escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            RenderNode::Text(text) => out.push_str(&escape_html(text)),
            RenderNode::Element { tag, children } => {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                for child in children {
                    child.write_html(out);
                }
                if !is_void(tag) {
                    out.push_str("</");
                    out.push_str(tag);
                    out.push('>');
                }
            }
        }
    }

    /// Concatenated text of the tree.
    pub fn text_content(&self) -> String {
        match self {
            RenderNode::Text(text) => text.clone(),
            RenderNode::Element { children, .. } => {
                children.iter().map(RenderNode::text_content).collect()
            }
        }
    }
}

fn is_void(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img")
}

type RenderFn = dyn Fn(&str) -> Result<Rendered, RenderError> + Send + Sync;

/// A host-supplied content renderer, shared by every render pass.
#[derive(Clone)]
pub struct MarkdownRenderer(Arc<RenderFn>);

impl MarkdownRenderer {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&str) -> Result<Rendered, RenderError> + Send + Sync + 'static,
    {
        MarkdownRenderer(Arc::new(render))
    }

    pub fn render(&self, text: &str) -> Result<Rendered, RenderError> {
        (self.0)(text)
    }
}

impl fmt::Debug for MarkdownRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MarkdownRenderer(..)")
    }
}

/// What goes inside a bubble.
#[derive(Debug, Clone, PartialEq)]
pub enum BubbleBody {
    /// Three-dot loading indicator, shown while the message is pending.
    Loading,
    Text(String),
    Markup(String),
    Node(RenderNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub id: MessageId,
    pub role: Role,
    pub error: bool,
    pub body: BubbleBody,
}

impl Bubble {
    /// The bubble's content with markup stripped; empty while loading.
    pub fn plain_text(&self) -> String {
        match &self.body {
            BubbleBody::Loading => String::new(),
            BubbleBody::Text(text) => text.clone(),
            BubbleBody::Markup(markup) => strip_tags(markup),
            BubbleBody::Node(node) => node.text_content(),
        }
    }
}

/// Renders every message, in order, into a bubble.
pub fn render_messages(messages: &[Message], renderer: Option<&MarkdownRenderer>) -> Vec<Bubble> {
    messages
        .iter()
        .map(|message| Bubble {
            id: message.id.clone(),
            role: message.role,
            error: message.error,
            body: render_body(message, renderer),
        })
        .collect()
}

fn render_body(message: &Message, renderer: Option<&MarkdownRenderer>) -> BubbleBody {
    if message.pending {
        return BubbleBody::Loading;
    }
    match (message.role, renderer) {
        (Role::Assistant, Some(renderer)) => render_with_fallback(renderer, &message.content),
        _ => BubbleBody::Text(message.content.clone()),
    }
}

thread_local! {
    static GUARDED: Cell<bool> = const { Cell::new(false) };
}

/// True while the current thread is inside a host renderer call whose
/// panic will be caught. Panic hooks use this to stay quiet.
pub fn in_guarded_render() -> bool {
    GUARDED.with(Cell::get)
}

/// Runs the host renderer behind a failure boundary.
fn render_with_fallback(renderer: &MarkdownRenderer, content: &str) -> BubbleBody {
    let outer = GUARDED.with(|g| g.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(content)));
    GUARDED.with(|g| g.set(outer));
    match result {
        Ok(Ok(Rendered::Markup(markup))) => BubbleBody::Markup(markup),
        Ok(Ok(Rendered::Node(node))) => BubbleBody::Node(node),
        Ok(Err(e)) => {
            warn!("Markdown renderer failed, showing raw text: {}", e);
            BubbleBody::Text(content.to_string())
        }
        Err(_) => {
            warn!("Markdown renderer panicked, showing raw text");
            BubbleBody::Text(content.to_string())
        }
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Drops tags and decodes the entities `escape_html` produces.
pub fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
