//! # PanelHeader Component
//!
//! Two lines on the accent colour: the title in bold, the subtitle dimmed.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::component::Component;
use crate::tui::surface::TermColors;

pub const HEADER_HEIGHT: u16 = 2;

pub struct PanelHeader<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub colors: TermColors,
}

impl Component for PanelHeader<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let base = Style::default().bg(self.colors.primary).fg(Color::White);
        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!(" {}", self.title),
                base.add_modifier(Modifier::BOLD),
            ),
            Span::styled("  [Ctrl+O ×]", base.add_modifier(Modifier::DIM)),
        ])];
        if !self.subtitle.is_empty() {
            lines.push(Line::from(Span::styled(
                format!(" {}", self.subtitle),
                base.add_modifier(Modifier::DIM),
            )));
        }
        frame.render_widget(Paragraph::new(lines).style(base), area);
    }
}
