//! Render tree → ratatui `Text` renderer.
//!
//! Walks a [`RenderNode`] tree (as produced by the markdown tree renderer)
//! and converts elements into styled `Line`/`Span` values. Headings, bold,
//! italic, strikethrough, inline code, preformatted blocks, lists,
//! blockquotes and rules.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::core::render::{Bubble, BubbleBody, RenderNode};

/// Converts a bubble's body into styled text.
///
/// Markup strings cannot be laid out in a terminal, so they are shown with
/// their tags stripped.
pub fn bubble_text(bubble: &Bubble, base_fg: Color) -> Text<'static> {
    match &bubble.body {
        BubbleBody::Node(node) => render(node, base_fg),
        _ => plain(&bubble.plain_text(), base_fg),
    }
}

/// Plain text, one `Line` per source line, tabs expanded.
pub fn plain(content: &str, base_fg: Color) -> Text<'static> {
    let style = Style::default().fg(base_fg);
    let lines: Vec<Line<'static>> = content
        .lines()
        .map(|l| Line::from(Span::styled(l.replace('\t', "    "), style)))
        .collect();
    Text::from(lines)
}

/// Render a node tree into styled `Text`.
pub fn render(node: &RenderNode, base_fg: Color) -> Text<'static> {
    let mut w = Writer::new(base_fg);
    w.node(node);
    w.text
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    text: Text<'static>,
    base_fg: Color,
    /// Inline style stack. Styles compose via `patch` so nested bold+italic works.
    styles: Vec<Style>,
    /// Per-line prefix spans (blockquote and code `│`).
    line_prefixes: Vec<Span<'static>>,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    /// True inside `pre`: text is laid out line by line.
    in_pre: bool,
    /// Whether the next block element should be preceded by a blank line.
    needs_newline: bool,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base_fg,
            styles: vec![],
            line_prefixes: vec![],
            list_indices: vec![],
            in_pre: false,
            needs_newline: false,
        }
    }

    // ── Style helpers ───────────────────────────────────────────────────

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    // ── Line/span helpers ───────────────────────────────────────────────

    fn push_line(&mut self, line: Line<'static>) {
        let mut out = line;
        for pfx in self.line_prefixes.iter().rev().cloned() {
            out.spans.insert(0, pfx);
        }
        self.text.lines.push(out);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        } else {
            self.push_line(Line::from(vec![span]));
        }
    }

    fn blank_line_if_needed(&mut self) {
        if self.needs_newline {
            self.push_line(Line::default());
            self.needs_newline = false;
        }
    }

    // ── Tree walk ───────────────────────────────────────────────────────

    fn node(&mut self, node: &RenderNode) {
        match node {
            RenderNode::Text(text) => self.content(text),
            RenderNode::Element { tag, children } => {
                self.open(tag);
                for child in children {
                    self.node(child);
                }
                self.close(tag);
            }
        }
    }

    fn open(&mut self, tag: &str) {
        match tag {
            "p" => {
                self.blank_line_if_needed();
                self.push_line(Line::default());
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.blank_line_if_needed();
                let hs = heading_style(self.base_fg, tag);
                self.push_line(Line::default());
                self.push_style(hs);
            }
            "blockquote" => {
                self.blank_line_if_needed();
                self.line_prefixes
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
                self.push_style(Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC));
            }
            "pre" => {
                if !self.text.lines.is_empty() {
                    self.push_line(Line::default());
                }
                let bs = Style::default().fg(Color::DarkGray);
                self.push_line(Line::from(Span::styled("╭──", bs)));
                self.line_prefixes.push(Span::styled("│ ", bs));
                self.in_pre = true;
            }
            "ul" | "ol" => {
                if self.list_indices.is_empty() {
                    self.blank_line_if_needed();
                }
                self.list_indices.push((tag == "ol").then_some(1));
            }
            "li" => {
                self.push_line(Line::default());
                let depth = self.list_indices.len().saturating_sub(1);
                let indent = "  ".repeat(depth);
                if let Some(idx) = self.list_indices.last_mut() {
                    let marker = match idx {
                        None => format!("{indent}- "),
                        Some(n) => {
                            let s = format!("{indent}{}. ", n);
                            *n += 1;
                            s
                        }
                    };
                    self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
                }
            }
            "em" => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            "strong" => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            "del" => self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            "a" => self.push_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            "code" if !self.in_pre => {
                self.styles
                    .push(Style::default().fg(Color::White).bg(Color::DarkGray));
            }
            "br" => self.push_line(Line::default()),
            "hr" => {
                self.blank_line_if_needed();
                self.push_line(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                )));
                self.needs_newline = true;
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: &str) {
        match tag {
            "p" => self.needs_newline = true,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.pop_style();
                self.needs_newline = true;
            }
            "blockquote" => {
                self.line_prefixes.pop();
                self.pop_style();
                self.needs_newline = true;
            }
            "pre" => {
                self.in_pre = false;
                self.line_prefixes.pop();
                let bs = Style::default().fg(Color::DarkGray);
                self.push_line(Line::from(Span::styled("╰──", bs)));
                self.needs_newline = true;
            }
            "ul" | "ol" => {
                self.list_indices.pop();
                self.needs_newline = true;
            }
            "em" | "strong" | "del" | "a" => self.pop_style(),
            "code" if !self.in_pre => self.pop_style(),
            _ => {}
        }
    }

    fn content(&mut self, raw: &str) {
        // Expand tabs → 4 spaces (ratatui renders \t as zero-width)
        let text = raw.replace('\t', "    ");

        if self.in_pre {
            let code_style = Style::default().fg(Color::White);
            for line in text.lines() {
                self.push_line(Line::from(Span::styled(line.to_owned(), code_style)));
            }
            return;
        }

        let style = self.style();
        self.push_span(Span::styled(text, style));
    }
}

fn heading_style(base_fg: Color, tag: &str) -> Style {
    match tag {
        "h1" => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        "h2" => Style::default().fg(base_fg).add_modifier(Modifier::BOLD),
        _ => Style::default()
            .fg(base_fg)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::MessageId;
    use crate::transport::Role;
    use crate::widget::markdown::to_tree;

    fn lines(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    #[test]
    fn heading_text_inherits_heading_style() {
        let text = render(&to_tree("## Hello"), Color::Blue);
        let span = text.lines[0].spans.iter().find(|s| s.content == "Hello").unwrap();
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(span.style.fg, Some(Color::Blue));
    }

    #[test]
    fn bold_text_is_bold() {
        let text = render(&to_tree("Some **bold** text"), Color::Blue);
        let bold_span = text.lines[0].spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold_span.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn inline_code_styled() {
        let text = render(&to_tree("Use `foo()` here"), Color::Blue);
        let code_span = text.lines[0].spans.iter().find(|s| s.content == "foo()").unwrap();
        assert_eq!(code_span.style.fg, Some(Color::White));
        assert_eq!(code_span.style.bg, Some(Color::DarkGray));
    }

    #[test]
    fn pre_block_has_border_structure() {
        let text = render(&to_tree("```\nline1\nline2\n```"), Color::Blue);
        let all = lines(&text);
        assert!(all[0].starts_with('╭'), "expected top border, got {:?}", all[0]);
        assert!(all[1].starts_with("│ ") && all[1].contains("line1"));
        assert!(all[2].starts_with("│ ") && all[2].contains("line2"));
        assert!(all.last().unwrap().starts_with('╰'));
    }

    #[test]
    fn ordered_list_is_numbered() {
        let text = render(&to_tree("1. one\n2. two\n"), Color::Blue);
        let all = lines(&text);
        assert!(all.contains(&"1. one".to_string()), "got {:?}", all);
        assert!(all.contains(&"2. two".to_string()), "got {:?}", all);
    }

    #[test]
    fn plain_text_uses_base_color() {
        let text = plain("hello\nworld", Color::Green);
        assert_eq!(text.lines.len(), 2);
        assert_eq!(text.lines[0].spans[0].style.fg, Some(Color::Green));
    }

    #[test]
    fn markup_bubble_is_stripped() {
        let bubble = Bubble {
            id: MessageId::generate(),
            role: Role::Assistant,
            error: false,
            body: BubbleBody::Markup("<p><b>hi</b> there</p>".to_string()),
        };
        assert_eq!(lines(&bubble_text(&bubble, Color::Reset)), vec!["hi there"]);
    }
}
