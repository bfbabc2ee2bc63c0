//! The terminal's [`Surface`]: keeps what the controller asked it to show,
//! for `ui::draw_ui` to paint on the next frame.

use ratatui::style::Color;

use crate::core::config::{Position, WidgetConfig};
use crate::core::render::Bubble;
use crate::core::theme::{Palette, Rgba, flatten, parse_color};
use crate::widget::Surface;

/// Palette resolved to terminal colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermColors {
    pub primary: Color,
    pub primary_soft: Color,
    pub surface: Color,
    pub surface_alt: Color,
    pub text: Color,
    pub border: Color,
}

impl TermColors {
    pub fn from_palette(palette: &Palette) -> Self {
        let surface = parse_color(palette.surface).unwrap_or(WHITE);
        let resolve = |value: &str| to_color(flatten(parse_color(value).unwrap_or(surface), surface));
        Self {
            primary: resolve(palette.primary.as_str()),
            primary_soft: resolve(palette.primary_soft),
            surface: to_color(surface),
            surface_alt: resolve(palette.surface_alt),
            text: resolve(palette.text),
            border: resolve(palette.border),
        }
    }
}

const WHITE: Rgba = Rgba {
    r: 255,
    g: 255,
    b: 255,
    a: 1.0,
};

fn to_color(c: Rgba) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

/// Everything the terminal needs from the config, captured on mount.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub title: String,
    pub subtitle: String,
    pub launcher_label: String,
    pub position: Position,
    /// Panel height in terminal rows.
    pub panel_rows: u16,
    pub colors: TermColors,
}

/// Pixels per terminal row when mapping the configured panel height.
const PX_PER_ROW: u32 = 20;

#[derive(Debug, Default)]
pub struct TerminalSurface {
    pub chrome: Option<Chrome>,
    pub bubbles: Vec<Bubble>,
    pub panel_open: bool,
    /// Set on every change; cleared by the event loop after drawing.
    pub dirty: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for TerminalSurface {
    fn mount(&mut self, config: &WidgetConfig) {
        let palette = Palette::for_config(config);
        self.chrome = Some(Chrome {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            launcher_label: config.launcher_label.clone(),
            position: config.position,
            panel_rows: (config.panel_height / PX_PER_ROW).clamp(8, u16::MAX as u32) as u16,
            colors: TermColors::from_palette(&palette),
        });
        self.panel_open = false;
        self.dirty = true;
    }

    fn render(&mut self, bubbles: &[Bubble]) {
        self.bubbles = bubbles.to_vec();
        self.dirty = true;
    }

    fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
        self.dirty = true;
    }

    fn unmount(&mut self) {
        self.chrome = None;
        self.bubbles.clear();
        self.panel_open = false;
        self.dirty = true;
    }
}
