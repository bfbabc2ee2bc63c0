//! Line-oriented surface for headless use.
//!
//! Prints the newest assistant bubble as it grows: only the new suffix is
//! written on each render, so streamed text appears progressively.

use std::io::Write;

use log::warn;

use crate::core::config::WidgetConfig;
use crate::core::render::{Bubble, BubbleBody};
use crate::transport::Role;

pub struct ConsoleSurface<W: Write> {
    out: W,
    /// Bubbles present when the current exchange started; never printed.
    skip: usize,
    /// How much of the tracked bubble has been written.
    printed: String,
}

impl<W: Write> ConsoleSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            skip: 0,
            printed: String::new(),
        }
    }

    /// Marks everything rendered so far as already seen.
    pub fn mark_seen(&mut self, seen: usize) {
        self.skip = seen;
        self.printed.clear();
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("Console write failed: {}", e);
        }
    }
}

impl<W: Write> super::Surface for ConsoleSurface<W> {
    fn mount(&mut self, _config: &WidgetConfig) {}

    fn render(&mut self, bubbles: &[Bubble]) {
        let Some(bubble) = bubbles
            .iter()
            .skip(self.skip)
            .rev()
            .find(|b| b.role == Role::Assistant)
        else {
            return;
        };
        if bubble.body == BubbleBody::Loading {
            return;
        }

        let text = bubble.plain_text();
        if let Some(suffix) = text.strip_prefix(self.printed.as_str()) {
            self.write(suffix);
        } else {
            // Final text replaced what was streamed
            self.write("\n");
            self.write(&text);
        }
        self.printed = text;
    }

    fn set_panel_open(&mut self, _open: bool) {}

    fn unmount(&mut self) {
        if !self.printed.is_empty() {
            self.write("\n");
            self.printed.clear();
        }
    }
}
