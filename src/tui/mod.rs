//! # TUI Adapter
//!
//! The ratatui-specific layer. Hosts a [`Widget`] over a [`TerminalSurface`],
//! paints the launcher and panel, and translates keyboard events into widget
//! calls.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! The loop only draws when the surface is dirty or an input event arrived.
//! While a reply is streaming it polls every ~80ms so the loading dots animate
//! and deltas appear promptly; idle, it sleeps up to 250ms between polls.
//!
//! The loop itself is synchronous. The turn task runs on the tokio runtime
//! that `main` started, and [`Widget::pump`] applies whatever it has sent
//! since the last iteration.
//!
//! ## Panics
//!
//! `ratatui::init` installs a hook that restores the terminal on panic. Panics
//! the widget already recovers from (a host markdown renderer, a turn task on a
//! runtime worker) are logged instead, so the TUI keeps its screen.

mod component;
mod components;
mod event;
pub mod markdown;
pub mod surface;
mod ui;

use std::io::stdout;
use std::panic;
use std::thread::{self, ThreadId};
use std::time::Duration;

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use log::{debug, error, info};

use crate::core::render;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputEvent, InputLine};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::widget::Widget;

pub use surface::TerminalSurface;

const STREAMING_POLL: Duration = Duration::from_millis(80);
const IDLE_POLL: Duration = Duration::from_millis(250);
/// Rows moved per scroll event.
const SCROLL_STEP: u16 = 3;

/// TUI-specific presentation state (not part of the widget's conversation state)
pub struct TuiState {
    pub input: InputLine,
    /// Rows scrolled up from the newest message.
    pub scroll: u16,
    /// Animation frame counter, advanced while a reply is streaming.
    pub tick: usize,
    pub sending: bool,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            input: InputLine::new(),
            scroll: 0,
            tick: 0,
            sending: false,
        }
    }
}

impl Default for TuiState {
    fn default() -> Self {
        Self::new()
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Shift+Enter through; terminals without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// True when a panic on this thread will be caught and recovered from.
fn panic_is_recovered(ui_thread: ThreadId) -> bool {
    render::in_guarded_render() || thread::current().id() != ui_thread
}

/// Wraps the installed hook so recovered panics leave the terminal alone.
fn install_panic_hook() {
    let ui_thread = thread::current().id();
    let restore = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if panic_is_recovered(ui_thread) {
            error!("Recovered panic: {}", info);
            return;
        }
        restore(info);
    }));
}

/// What the loop should do after an event.
#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

/// Routes one terminal event to the widget or the TUI-local state.
fn handle_event(widget: &mut Widget<TerminalSurface>, tui: &mut TuiState, event: TuiEvent) -> Flow {
    match event {
        TuiEvent::Quit => return Flow::Quit,
        TuiEvent::TogglePanel => {
            widget.toggle_panel(None);
            tui.scroll = 0;
        }
        TuiEvent::ScrollUp => tui.scroll = tui.scroll.saturating_add(SCROLL_STEP),
        TuiEvent::ScrollDown => tui.scroll = tui.scroll.saturating_sub(SCROLL_STEP),
        TuiEvent::Resize => {}
        other if widget.is_panel_open() => {
            if let Some(InputEvent::Submit(text)) = tui.input.handle_event(&other) {
                if widget.submit(&text) {
                    tui.input.clear();
                    tui.scroll = 0;
                } else {
                    debug!("Submit rejected, keeping input");
                }
            }
        }
        // Typing with the panel closed opens it, like clicking the launcher
        other @ (TuiEvent::InputChar(_) | TuiEvent::Paste(_)) => {
            widget.toggle_panel(Some(true));
            tui.input.handle_event(&other);
        }
        _ => {}
    }
    Flow::Continue
}

pub fn run(widget: &mut Widget<TerminalSurface>) -> std::io::Result<()> {
    let mut tui = TuiState::new();
    let mut terminal = ratatui::init();
    install_panic_hook();
    let _terminal_mode_guard = TerminalModeGuard::new();
    info!("TUI started for chatbot {}", widget.config().chatbot_id);

    let mut needs_redraw = true;
    loop {
        if widget.pump() > 0 {
            needs_redraw = true;
        }
        tui.sending = widget.is_sending();
        if tui.sending {
            tui.tick = tui.tick.wrapping_add(1);
            needs_redraw = true;
        }

        if needs_redraw || widget.surface().dirty {
            terminal.draw(|f| ui::draw_ui(f, widget.surface(), &mut tui))?;
            widget.surface_mut().dirty = false;
            needs_redraw = false;
        }

        let timeout = if tui.sending { STREAMING_POLL } else { IDLE_POLL };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        let mut should_quit = false;
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if handle_event(widget, &mut tui, event) == Flow::Quit {
                should_quit = true;
                break;
            }
        }
        if should_quit {
            break;
        }
    }

    info!("TUI exiting");
    ratatui::restore();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedTransport, test_options};
    use crate::transport::Role;
    use std::sync::Arc;

    fn widget(transport: ScriptedTransport) -> Widget<TerminalSurface> {
        let mut widget =
            Widget::with_transport(test_options(), Arc::new(transport), TerminalSurface::new())
                .unwrap();
        widget.mount();
        widget
    }

    fn type_text(widget: &mut Widget<TerminalSurface>, tui: &mut TuiState, text: &str) {
        for c in text.chars() {
            handle_event(widget, tui, TuiEvent::InputChar(c));
        }
    }

    #[test]
    fn test_quit_and_toggle() {
        let mut w = widget(ScriptedTransport::hanging());
        let mut tui = TuiState::new();
        assert_eq!(handle_event(&mut w, &mut tui, TuiEvent::TogglePanel), Flow::Continue);
        assert!(w.is_panel_open());
        handle_event(&mut w, &mut tui, TuiEvent::TogglePanel);
        assert!(!w.is_panel_open());
        assert_eq!(handle_event(&mut w, &mut tui, TuiEvent::Quit), Flow::Quit);
    }

    #[test]
    fn test_typing_opens_panel() {
        let mut w = widget(ScriptedTransport::hanging());
        let mut tui = TuiState::new();
        type_text(&mut w, &mut tui, "hi");
        assert!(w.is_panel_open());
        assert_eq!(tui.input.buffer, "hi");
    }

    #[tokio::test]
    async fn test_enter_submits_and_clears_input() {
        let mut w = widget(ScriptedTransport::reply(&["hello ", "there"], "hello there"));
        let mut tui = TuiState::new();
        type_text(&mut w, &mut tui, "hi");
        handle_event(&mut w, &mut tui, TuiEvent::Submit);
        assert!(tui.input.buffer.is_empty());
        assert!(w.is_sending());

        w.settle().await;
        let last = w.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, "hello there");
    }

    #[tokio::test]
    async fn test_enter_while_sending_keeps_input() {
        let mut w = widget(ScriptedTransport::hanging());
        let mut tui = TuiState::new();
        type_text(&mut w, &mut tui, "first");
        handle_event(&mut w, &mut tui, TuiEvent::Submit);
        type_text(&mut w, &mut tui, "second");
        handle_event(&mut w, &mut tui, TuiEvent::Submit);
        assert_eq!(tui.input.buffer, "second");
        w.destroy();
    }

    #[test]
    fn test_recovered_panics_are_recognized() {
        let here = thread::current().id();
        assert!(!panic_is_recovered(here));

        let worker = thread::spawn(move || panic_is_recovered(here)).join().unwrap();
        assert!(worker);

        let renderer = crate::core::render::MarkdownRenderer::new(move |_| {
            Ok(crate::core::render::Rendered::Markup(panic_is_recovered(here).to_string()))
        });
        let message = crate::core::message::Message::assistant("x");
        let bubbles = render::render_messages(std::slice::from_ref(&message), Some(&renderer));
        assert_eq!(bubbles[0].plain_text(), "true");
    }

    #[test]
    fn test_scroll_saturates() {
        let mut w = widget(ScriptedTransport::hanging());
        let mut tui = TuiState::new();
        handle_event(&mut w, &mut tui, TuiEvent::ScrollDown);
        assert_eq!(tui.scroll, 0);
        handle_event(&mut w, &mut tui, TuiEvent::ScrollUp);
        assert_eq!(tui.scroll, SCROLL_STEP);
    }
}
