//! The seam between the widget controller and whatever displays it.

use crate::core::config::WidgetConfig;
use crate::core::render::Bubble;

/// A place a widget can be mounted into.
///
/// The controller calls `render` with the complete bubble list after every
/// mutation; surfaces replace what they show rather than patching it.
pub trait Surface {
    /// Build the launcher and the (closed) panel.
    fn mount(&mut self, config: &WidgetConfig);

    /// Replace the displayed messages.
    fn render(&mut self, bubbles: &[Bubble]);

    fn set_panel_open(&mut self, open: bool);

    /// Tear down everything `mount` created.
    fn unmount(&mut self);
}

/// Headless surface that records what it was asked to show.
#[derive(Debug, Default)]
pub struct MemorySurface {
    pub mounted: bool,
    pub title: Option<String>,
    pub panel_open: bool,
    pub bubbles: Vec<Bubble>,
    /// Number of `render` calls since creation.
    pub renders: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for MemorySurface {
    fn mount(&mut self, config: &WidgetConfig) {
        self.mounted = true;
        self.title = Some(config.title.clone());
        self.panel_open = false;
    }

    fn render(&mut self, bubbles: &[Bubble]) {
        self.bubbles = bubbles.to_vec();
        self.renders += 1;
    }

    fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    fn unmount(&mut self) {
        self.mounted = false;
        self.title = None;
        self.panel_open = false;
        self.bubbles.clear();
    }
}
