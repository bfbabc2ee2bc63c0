use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, BorderType, Clear};

use crate::core::config::Position;
use crate::tui::TuiState;
use crate::tui::component::Component;
use crate::tui::components::{BubbleList, Launcher, PanelHeader};
use crate::tui::components::header::HEADER_HEIGHT;
use crate::tui::components::launcher::LAUNCHER_HEIGHT;
use crate::tui::surface::{Chrome, TerminalSurface};

/// Panel width in columns, before clamping to the terminal.
const PANEL_WIDTH: u16 = 56;
/// Gap between the panel and the screen edge.
const MARGIN: u16 = 1;

/// Anchors a `width` x `height` box in the bottom corner named by `position`,
/// `lift` rows above the bottom margin.
fn anchor(area: Rect, position: Position, width: u16, height: u16, lift: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(MARGIN * 2));
    let height = height.min(area.height.saturating_sub(MARGIN + lift));
    let x = match position {
        Position::BottomRight => area.right().saturating_sub(width + MARGIN),
        Position::BottomLeft => area.x + MARGIN,
    };
    let y = area.bottom().saturating_sub(MARGIN + lift + height);
    Rect::new(x, y, width, height)
}

pub fn draw_ui(frame: &mut Frame, surface: &TerminalSurface, tui: &mut TuiState) {
    let Some(chrome) = surface.chrome.as_ref() else {
        return;
    };
    let area = frame.area();

    let mut launcher = Launcher {
        label: &chrome.launcher_label,
        open: surface.panel_open,
        colors: chrome.colors,
    };
    let launcher_area = anchor(area, chrome.position, launcher.width(), LAUNCHER_HEIGHT, 0);
    launcher.render(frame, launcher_area);

    if surface.panel_open {
        let panel_area = anchor(area, chrome.position, PANEL_WIDTH, chrome.panel_rows, LAUNCHER_HEIGHT);
        draw_panel(frame, panel_area, chrome, surface, tui);
    }
}

fn draw_panel(
    frame: &mut Frame,
    area: Rect,
    chrome: &Chrome,
    surface: &TerminalSurface,
    tui: &mut TuiState,
) {
    if area.width < 8 || area.height < HEADER_HEIGHT + 5 {
        return;
    }
    let colors = chrome.colors;
    frame.render_widget(Clear, area);
    let frame_block = Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.border))
        .style(Style::default().bg(colors.surface).fg(colors.text));
    let inner = frame_block.inner(area);
    frame.render_widget(frame_block, area);

    tui.input.colors = Some(colors);
    tui.input.busy = tui.sending;
    let input_height = tui.input.height(inner.width);

    use Constraint::{Length, Min};
    let [header_area, list_area, input_area] =
        Layout::vertical([Length(HEADER_HEIGHT), Min(1), Length(input_height)]).areas(inner);

    PanelHeader {
        title: &chrome.title,
        subtitle: &chrome.subtitle,
        colors,
    }
    .render(frame, header_area);

    BubbleList {
        bubbles: &surface.bubbles,
        colors,
        tick: tui.tick,
        scroll: &mut tui.scroll,
    }
    .render(frame, list_area);

    tui.input.render(frame, input_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{WidgetConfig, WidgetOptions};
    use crate::core::message::Message;
    use crate::core::render::render_messages;
    use crate::widget::Surface;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn mounted(position: Position) -> TerminalSurface {
        let config = WidgetConfig::from_options(WidgetOptions {
            chatbot_id: Some("bot".to_string()),
            api_base_url: Some("http://localhost:8000".to_string()),
            title: Some("Helpdesk".to_string()),
            position: Some(position),
            ..Default::default()
        })
        .unwrap();
        let mut surface = TerminalSurface::new();
        surface.mount(&config);
        surface
    }

    fn draw(surface: &TerminalSurface, tui: &mut TuiState) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw_ui(f, surface, tui)).unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }

    fn column_of(row: &str, needle: &str) -> usize {
        let byte = row.find(needle).unwrap();
        row[..byte].chars().count()
    }

    #[test]
    fn test_closed_panel_shows_only_launcher() {
        let surface = mounted(Position::BottomRight);
        let rows = draw(&surface, &mut TuiState::new());
        let screen = rows.join("\n");
        assert!(screen.contains("Chat with us"));
        assert!(!screen.contains("Helpdesk"));
    }

    #[test]
    fn test_open_panel_shows_header_and_bubbles() {
        let mut surface = mounted(Position::BottomRight);
        surface.set_panel_open(true);
        let messages = vec![Message::assistant("Welcome aboard")];
        surface.render(&render_messages(&messages, None));

        let screen = draw(&surface, &mut TuiState::new()).join("\n");
        assert!(screen.contains("Helpdesk"));
        assert!(screen.contains("Welcome aboard"));
        assert!(screen.contains("Type your message"));
    }

    #[test]
    fn test_launcher_follows_position() {
        let rows = draw(&mounted(Position::BottomLeft), &mut TuiState::new());
        let launcher_row = rows.iter().find(|r| r.contains("Chat with us")).unwrap();
        let column = column_of(launcher_row, "Chat with us");
        assert!(column < 10, "launcher should sit on the left, found at {column}");

        let rows = draw(&mounted(Position::BottomRight), &mut TuiState::new());
        let launcher_row = rows.iter().find(|r| r.contains("Chat with us")).unwrap();
        assert!(column_of(launcher_row, "Chat with us") > 60);
    }

    #[test]
    fn test_unmounted_draws_nothing() {
        let surface = TerminalSurface::new();
        let screen = draw(&surface, &mut TuiState::new()).join("");
        assert!(screen.trim().is_empty());
    }
}
