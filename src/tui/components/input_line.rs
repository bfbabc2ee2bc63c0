//! # InputLine Component
//!
//! The composer at the bottom of the panel. Append-only editing: characters,
//! pastes and backspace at the end of the buffer. Enter emits
//! [`InputEvent::Submit`] but leaves the buffer alone; the event loop calls
//! [`InputLine::clear`] once the widget has accepted the message, so a
//! rejected submit keeps what the user typed.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::surface::TermColors;

/// Border (2) + padding (2) consumed horizontally
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders
const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines; older lines scroll off the top
const MAX_VISIBLE_LINES: u16 = 4;

pub const PLACEHOLDER: &str = "Type your message…";

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Submit(String),
    ContentChanged,
}

#[derive(Debug, Default)]
pub struct InputLine {
    pub buffer: String,
    /// Greys the composer out while a reply is streaming.
    pub busy: bool,
    pub colors: Option<TermColors>,
}

fn wrap_options(width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(width.max(1) as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn wrapped(&self, width: u16) -> Vec<String> {
        let inner = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if self.buffer.is_empty() || inner == 0 {
            return vec![String::new()];
        }
        let mut lines: Vec<String> = textwrap::wrap(&self.buffer, wrap_options(inner))
            .into_iter()
            .map(|l| l.into_owned())
            .collect();
        // textwrap drops the empty line after a trailing newline
        if self.buffer.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
            lines.push(String::new());
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }

    /// Rows needed for the current buffer, borders included.
    pub fn height(&self, width: u16) -> u16 {
        let lines = self.wrapped(width).len() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }
}

impl Component for InputLine {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let colors = self.colors;
        let accent = colors.map(|c| c.primary).unwrap_or_default();
        let mut block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(if self.busy {
                colors.map(|c| c.border).unwrap_or_default()
            } else {
                accent
            }))
            .padding(Padding::horizontal(1));
        if let Some(c) = colors {
            block = block.style(Style::default().bg(c.surface).fg(c.text));
        }

        if self.buffer.is_empty() {
            let hint = Span::styled(PLACEHOLDER, Style::default().add_modifier(Modifier::DIM));
            frame.render_widget(Paragraph::new(hint).block(block), area);
            frame.set_cursor_position((area.x + 2, area.y + 1));
            return;
        }

        let lines = self.wrapped(area.width);
        let skip = lines.len().saturating_sub(MAX_VISIBLE_LINES as usize);
        let visible = &lines[skip..];
        frame.render_widget(Paragraph::new(visible.join("\n")).block(block), area);

        let last = visible.last().map(|l| l.width()).unwrap_or(0) as u16;
        let max_x = area.x + area.width.saturating_sub(3);
        let cursor_x = (area.x + 2 + last).min(max_x);
        let cursor_y = area.y + visible.len() as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

impl EventHandler for InputLine {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.push(*c);
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                // Normalise CRLF from clipboard managers
                self.buffer.push_str(&text.replace("\r\n", "\n"));
                Some(InputEvent::ContentChanged)
            }
            TuiEvent::Backspace => self.buffer.pop().map(|_| InputEvent::ContentChanged),
            TuiEvent::Submit => {
                (!self.buffer.trim().is_empty()).then(|| InputEvent::Submit(self.buffer.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_typing_and_backspace() {
        let mut input = InputLine::new();
        assert_eq!(
            input.handle_event(&TuiEvent::InputChar('h')),
            Some(InputEvent::ContentChanged)
        );
        input.handle_event(&TuiEvent::InputChar('é'));
        assert_eq!(input.buffer, "hé");
        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.buffer, "h");
        input.handle_event(&TuiEvent::Backspace);
        assert_eq!(input.handle_event(&TuiEvent::Backspace), None);
    }

    #[test]
    fn test_submit_keeps_buffer_until_cleared() {
        let mut input = InputLine::new();
        input.buffer = "hello".to_string();
        assert_eq!(
            input.handle_event(&TuiEvent::Submit),
            Some(InputEvent::Submit("hello".to_string()))
        );
        assert_eq!(input.buffer, "hello");
        input.clear();
        assert!(input.buffer.is_empty());
    }

    #[test]
    fn test_blank_submit_ignored() {
        let mut input = InputLine::new();
        input.buffer = "  \n ".to_string();
        assert_eq!(input.handle_event(&TuiEvent::Submit), None);
    }

    #[test]
    fn test_paste_normalises_newlines() {
        let mut input = InputLine::new();
        input.handle_event(&TuiEvent::Paste("a\r\nb".to_string()));
        assert_eq!(input.buffer, "a\nb");
    }

    #[test]
    fn test_height_grows_and_caps() {
        let mut input = InputLine::new();
        assert_eq!(input.height(20), 3);
        input.buffer = "one\ntwo".to_string();
        assert_eq!(input.height(20), 4);
        input.buffer = "1\n2\n3\n4\n5\n6\n7".to_string();
        assert_eq!(input.height(20), MAX_VISIBLE_LINES + VERTICAL_OVERHEAD);
    }

    #[test]
    fn test_placeholder_rendered_when_empty() {
        let mut terminal = Terminal::new(TestBackend::new(30, 3)).unwrap();
        let mut input = InputLine::new();
        terminal.draw(|f| input.render(f, f.area())).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Type your message"));
    }
}
