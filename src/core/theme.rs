//! Theme palette.
//!
//! The widget shell styles itself from a fixed set of CSS custom properties
//! set on its container. This module computes them; hosts that are not a
//! browser (the terminal shell) parse the same values into colours.

use crate::core::config::{Theme, WidgetConfig};

pub const PRIMARY: &str = "--bot-primary";
pub const PRIMARY_SOFT: &str = "--bot-primary-soft";
pub const PANEL_HEIGHT: &str = "--bot-panel-height";
pub const SURFACE: &str = "--bot-surface";
pub const SURFACE_ALT: &str = "--bot-surface-alt";
pub const TEXT: &str = "--bot-text";
pub const BORDER: &str = "--bot-border";

/// Resolved colours for one widget instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub primary: String,
    pub primary_soft: &'static str,
    pub surface: &'static str,
    pub surface_alt: &'static str,
    pub text: &'static str,
    pub border: &'static str,
    pub panel_height: u32,
}

impl Palette {
    pub fn for_config(config: &WidgetConfig) -> Self {
        Self::new(config.theme, &config.accent_color, config.panel_height)
    }

    pub fn new(theme: Theme, accent: &str, panel_height: u32) -> Self {
        match theme {
            Theme::Dark => Self {
                primary: accent.to_string(),
                primary_soft: "rgba(99, 102, 241, 0.82)",
                surface: "#0f172a",
                surface_alt: "rgba(15, 23, 42, 0.78)",
                text: "#e2e8f0",
                border: "rgba(148, 163, 184, 0.28)",
                panel_height,
            },
            Theme::Light => Self {
                primary: accent.to_string(),
                primary_soft: "rgba(59, 130, 246, 0.82)",
                surface: "#f8fafc",
                surface_alt: "#ffffff",
                text: "#0f172a",
                border: "rgba(15, 23, 42, 0.1)",
                panel_height,
            },
        }
    }

    /// `(name, value)` pairs in the order they are set on the container.
    pub fn custom_properties(&self) -> Vec<(&'static str, String)> {
        vec![
            (PRIMARY, self.primary.clone()),
            (PRIMARY_SOFT, self.primary_soft.to_string()),
            (PANEL_HEIGHT, format!("{}px", self.panel_height)),
            (SURFACE, self.surface.to_string()),
            (SURFACE_ALT, self.surface_alt.to_string()),
            (TEXT, self.text.to_string()),
            (BORDER, self.border.to_string()),
        ]
    }

    /// The properties as an inline `style` attribute value.
    pub fn inline_style(&self) -> String {
        self.custom_properties()
            .iter()
            .map(|(name, value)| format!("{name}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// An sRGB colour with alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

/// Parses `#rgb`, `#rrggbb`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
pub fn parse_color(value: &str) -> Option<Rgba> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    let (args, has_alpha) = if let Some(rest) = value.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else if let Some(rest) = value.strip_prefix("rgb(") {
        (rest.strip_suffix(')')?, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let expected = if has_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }
    let a = if has_alpha {
        parts[3].parse::<f32>().ok()?.clamp(0.0, 1.0)
    } else {
        1.0
    };
    Some(Rgba {
        r: parts[0].parse().ok()?,
        g: parts[1].parse().ok()?,
        b: parts[2].parse().ok()?,
        a,
    })
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
            Some(Rgba {
                r: expand(0)?,
                g: expand(1)?,
                b: expand(2)?,
                a: 1.0,
            })
        }
        6 => Some(Rgba {
            r: channel(&hex[0..2])?,
            g: channel(&hex[2..4])?,
            b: channel(&hex[4..6])?,
            a: 1.0,
        }),
        _ => None,
    }
}

/// Blends a translucent colour onto an opaque background.
pub fn flatten(color: Rgba, background: Rgba) -> Rgba {
    let mix = |fg: u8, bg: u8| -> u8 {
        (fg as f32 * color.a + bg as f32 * (1.0 - color.a)).round() as u8
    };
    Rgba {
        r: mix(color.r, background.r),
        g: mix(color.g, background.g),
        b: mix(color.b, background.b),
        a: 1.0,
    }
}
