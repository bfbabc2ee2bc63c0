use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::Component;
use crate::tui::surface::TermColors;

pub const LAUNCHER_HEIGHT: u16 = 3;

/// The launcher pill. Shows its label and the key that toggles the panel.
pub struct Launcher<'a> {
    pub label: &'a str,
    pub open: bool,
    pub colors: TermColors,
}

impl Launcher<'_> {
    fn text(&self) -> String {
        let icon = if self.open { "▾" } else { "💬" };
        format!("{icon} {}", self.label)
    }

    /// Width including borders and one column of padding per side.
    pub fn width(&self) -> u16 {
        (self.text().width() as u16).saturating_add(4)
    }
}

impl Component for Launcher<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let style = Style::default()
            .bg(self.colors.primary)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        let pill = Paragraph::new(format!(" {}", self.text()))
            .style(style)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(self.colors.primary)),
            );
        frame.render_widget(pill, area);
    }
}
