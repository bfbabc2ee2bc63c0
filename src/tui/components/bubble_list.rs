//! # BubbleList Component
//!
//! The panel body: every bubble stacked top to bottom, bottom-anchored so the
//! newest message is visible. `scroll` counts rows scrolled up from the bottom.
//!
//! Heights are measured with `Paragraph::line_count` before drawing, so only
//! bubbles intersecting the viewport are rendered, each clipped by scrolling
//! its own paragraph.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Wrap};

use crate::core::render::{Bubble, BubbleBody};
use crate::transport::Role;
use crate::tui::component::Component;
use crate::tui::markdown;
use crate::tui::surface::TermColors;

/// Columns kept free on the opposite side of a bubble (user right, assistant left).
const SIDE_GUTTER: u16 = 4;

const ERROR_FG: Color = Color::Rgb(0x99, 0x1b, 0x1b);
const ERROR_BORDER: Color = Color::Rgb(0xef, 0x44, 0x44);

pub struct BubbleList<'a> {
    pub bubbles: &'a [Bubble],
    pub colors: TermColors,
    /// Animation frame counter for the loading dots.
    pub tick: usize,
    /// Rows scrolled up from the bottom. Clamped during render.
    pub scroll: &'a mut u16,
}

struct Laid<'a> {
    paragraph: Paragraph<'a>,
    height: u16,
    role: Role,
}

impl<'a> BubbleList<'a> {
    fn lay_out(&self, width: u16) -> Vec<Laid<'static>> {
        let inner = width.saturating_sub(SIDE_GUTTER);
        self.bubbles
            .iter()
            .map(|bubble| {
                let paragraph = bubble_paragraph(bubble, self.colors, self.tick);
                // line_count includes the block's top and bottom borders
                let height = paragraph.line_count(inner.saturating_sub(4)) as u16;
                Laid {
                    paragraph,
                    height,
                    role: bubble.role,
                }
            })
            .collect()
    }
}

impl Component for BubbleList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        frame.render_widget(
            Block::default().style(Style::default().bg(self.colors.surface_alt)),
            area,
        );

        let laid = self.lay_out(area.width);
        let total: u16 = laid.iter().map(|l| l.height).fold(0u16, u16::saturating_add);
        let max_scroll = total.saturating_sub(area.height);
        *self.scroll = (*self.scroll).min(max_scroll);

        // Content row shown at the top of the viewport
        let top = max_scroll - *self.scroll;
        let bottom = top + area.height;

        let bubble_width = area.width.saturating_sub(SIDE_GUTTER);
        let mut y: u16 = 0;
        for item in laid {
            let start = y;
            let end = y.saturating_add(item.height);
            y = end;
            if end <= top || start >= bottom {
                continue;
            }
            let skip = top.saturating_sub(start);
            let visible_start = start.max(top);
            let visible_end = end.min(bottom);
            let x = match item.role {
                Role::User => area.x + SIDE_GUTTER.min(area.width),
                Role::Assistant => area.x,
            };
            let rect = Rect::new(
                x,
                area.y + (visible_start - top),
                bubble_width,
                visible_end - visible_start,
            );
            frame.render_widget(item.paragraph.scroll((skip, 0)), rect);
        }
    }
}

/// Builds the bordered paragraph for one bubble.
fn bubble_paragraph(bubble: &Bubble, colors: TermColors, tick: usize) -> Paragraph<'static> {
    let (label, fg, border) = match (bubble.role, bubble.error) {
        (_, true) => ("assistant · error", ERROR_FG, ERROR_BORDER),
        (Role::User, false) => ("you", Color::White, colors.primary),
        (Role::Assistant, false) => ("assistant", colors.text, colors.border),
    };
    let bg = match (bubble.role, bubble.error) {
        (_, true) => Color::Rgb(0xfe, 0xe2, 0xe2),
        (Role::User, false) => colors.primary,
        (Role::Assistant, false) => colors.surface,
    };

    let text: Text<'static> = match &bubble.body {
        BubbleBody::Loading => loading_dots(tick, colors.primary),
        _ => markdown::bubble_text(bubble, fg),
    };

    Paragraph::new(text)
        .style(Style::default().fg(fg).bg(bg))
        .wrap(Wrap { trim: false })
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border))
                .title(Span::styled(label, Style::default().fg(border).add_modifier(Modifier::DIM)))
                .padding(Padding::horizontal(1)),
        )
}

/// Three dots, one of them bright, cycling with `tick`.
fn loading_dots(tick: usize, color: Color) -> Text<'static> {
    let active = (tick / 3) % 3;
    let spans: Vec<Span<'static>> = (0..3)
        .map(|i| {
            let style = if i == active {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };
            Span::styled(if i < 2 { "● " } else { "●" }, style)
        })
        .collect();
    Text::from(Line::from(spans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Theme;
    use crate::core::message::MessageId;
    use crate::core::theme::Palette;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn colors() -> TermColors {
        TermColors::from_palette(&Palette::new(Theme::Light, "#2563eb", 640))
    }

    fn bubble(role: Role, body: BubbleBody) -> Bubble {
        Bubble {
            id: MessageId::generate(),
            role,
            error: false,
            body,
        }
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_single_line_bubble_height() {
        let list = BubbleList {
            bubbles: &[bubble(Role::User, BubbleBody::Text("hello".to_string()))],
            colors: colors(),
            tick: 0,
            scroll: &mut 0,
        };
        let laid = list.lay_out(40);
        assert_eq!(laid[0].height, 3);
    }

    #[test]
    fn test_renders_latest_bubbles() {
        let bubbles: Vec<Bubble> = (0..10)
            .map(|i| bubble(Role::Assistant, BubbleBody::Text(format!("message {i}"))))
            .collect();
        let mut scroll = 0u16;
        let mut terminal = Terminal::new(TestBackend::new(30, 9)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                BubbleList {
                    bubbles: &bubbles,
                    colors: colors(),
                    tick: 0,
                    scroll: &mut scroll,
                }
                .render(f, area);
            })
            .unwrap();
        let content = screen(&terminal);
        assert!(content.contains("message 9"));
        assert!(!content.contains("message 0"));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let bubbles = vec![bubble(Role::User, BubbleBody::Text("short".to_string()))];
        let mut scroll = 500u16;
        let mut terminal = Terminal::new(TestBackend::new(30, 10)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                BubbleList {
                    bubbles: &bubbles,
                    colors: colors(),
                    tick: 0,
                    scroll: &mut scroll,
                }
                .render(f, area);
            })
            .unwrap();
        assert_eq!(scroll, 0);
        assert!(screen(&terminal).contains("short"));
    }

    #[test]
    fn test_loading_dots_cycle() {
        let first = loading_dots(0, Color::Blue);
        let later = loading_dots(3, Color::Blue);
        assert_ne!(first, later);
        assert_eq!(first.lines[0].spans.len(), 3);
    }
}
