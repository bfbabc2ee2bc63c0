//! Static HTML rendering of a widget.
//!
//! Produces a self-contained document: the stylesheet, the container carrying
//! the theme's custom properties, the panel with its bubbles, and the launcher.
//! Used for `--snapshot` and anywhere a host wants markup instead of a live
//! surface.

use crate::core::config::WidgetConfig;
use crate::core::render::{Bubble, BubbleBody, escape_html};
use crate::core::theme::Palette;

pub const STYLE_ID: &str = "bot-studio-widget-styles";

const STYLES: &str = r#"
.bot-widget-root { all: initial; font-family: "Inter", system-ui, sans-serif; }
.bot-widget-root *, .bot-widget-root *::before, .bot-widget-root *::after { box-sizing: border-box; }
.bot-widget-container {
  position: fixed; bottom: 24px; right: 24px; z-index: 2147480000;
  display: flex; flex-direction: column; gap: 12px; align-items: flex-end;
}
.bot-widget-container[data-theme="dark"] { color-scheme: dark; }
.bot-widget-container[data-position="bottom-left"] { right: auto; left: 24px; align-items: flex-start; }
.bot-widget-launcher {
  border: none; border-radius: 9999px; padding: 12px 18px;
  background: var(--bot-primary); color: #fff; font-weight: 600; cursor: pointer;
}
.bot-widget-panel {
  width: min(380px, calc(100vw - 40px));
  height: min(var(--bot-panel-height), calc(100vh - 96px));
  display: none; flex-direction: column; overflow: hidden;
  background: var(--bot-surface); color: var(--bot-text);
  border-radius: 18px; border: 1px solid var(--bot-border);
}
.bot-widget-panel[data-open="true"] { display: flex; }
.bot-widget-header {
  display: flex; justify-content: space-between; align-items: center; padding: 20px 22px;
  background: linear-gradient(135deg, var(--bot-primary), var(--bot-primary-soft)); color: #fff;
}
.bot-widget-header strong { font-size: 1.06rem; }
.bot-widget-header span { font-size: 0.75rem; opacity: 0.75; }
.bot-widget-body {
  flex: 1; padding: 20px; display: flex; flex-direction: column; gap: 14px;
  overflow-y: auto; background: var(--bot-surface-alt);
}
.bot-widget-message { max-width: 85%; padding: 12px 16px; border-radius: 18px; line-height: 1.5; }
.bot-widget-message[data-role="user"] { align-self: flex-end; background: var(--bot-primary); color: #fff; }
.bot-widget-message[data-role="assistant"] {
  align-self: flex-start; background: #fff; color: var(--bot-text);
  border: 1px solid rgba(148, 163, 184, 0.32);
}
.bot-widget-message[data-error="true"] { border-color: #ef4444; background: #fee2e2; color: #991b1b; }
.bot-widget-footer {
  padding: 18px 20px; display: flex; gap: 10px;
  border-top: 1px solid var(--bot-border); background: var(--bot-surface);
}
.bot-widget-input {
  flex: 1; min-height: 48px; border-radius: 14px; padding: 12px 14px; resize: none;
  border: 1px solid rgba(148, 163, 184, 0.4); background: var(--bot-surface-alt); color: var(--bot-text);
}
.bot-widget-send { width: 50px; border-radius: 14px; border: none; background: var(--bot-primary); color: #fff; }
.bot-widget-loading { display: inline-flex; gap: 6px; align-items: center; color: var(--bot-primary); }
.bot-widget-loading span {
  width: 6px; height: 6px; background: currentColor; border-radius: 50%;
  animation: bot-dot 1s infinite ease-in-out;
}
.bot-widget-loading span:nth-child(2) { animation-delay: .2s; }
.bot-widget-loading span:nth-child(3) { animation-delay: .4s; }
@keyframes bot-dot { 0%, 80%, 100% { transform: scale(.6); } 40% { transform: scale(1); } }
"#;

const LOADER: &str = r#"<div class="bot-widget-loading"><span></span><span></span><span></span></div>"#;

/// Renders the whole widget as a standalone document.
pub fn render_document(config: &WidgetConfig, bubbles: &[Bubble], panel_open: bool) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(&config.title)));
    out.push_str(&format!("<style id=\"{STYLE_ID}\">{STYLES}</style>\n"));
    out.push_str("</head>\n<body>\n");
    out.push_str(&render_widget(config, bubbles, panel_open));
    out.push_str("\n</body>\n</html>\n");
    out
}

/// Renders the widget's root element only.
pub fn render_widget(config: &WidgetConfig, bubbles: &[Bubble], panel_open: bool) -> String {
    let palette = Palette::for_config(config);
    let mut out = String::new();

    out.push_str("<div class=\"bot-widget-root\">");
    out.push_str(&format!(
        "<div class=\"bot-widget-container\" data-theme=\"{}\" data-position=\"{}\" style=\"{}\">",
        config.theme,
        config.position,
        escape_html(&palette.inline_style())
    ));

    out.push_str(&format!(
        "<div class=\"bot-widget-panel\" data-open=\"{panel_open}\">"
    ));
    out.push_str("<div class=\"bot-widget-header\"><div>");
    out.push_str(&format!("<strong>{}</strong>", escape_html(&config.title)));
    if !config.subtitle.is_empty() {
        out.push_str(&format!("<span>{}</span>", escape_html(&config.subtitle)));
    }
    out.push_str("</div><button type=\"button\">×</button></div>");

    out.push_str("<div class=\"bot-widget-body\">");
    for bubble in bubbles {
        out.push_str(&render_bubble(bubble));
    }
    out.push_str("</div>");

    out.push_str(concat!(
        "<div class=\"bot-widget-footer\">",
        "<textarea class=\"bot-widget-input\" placeholder=\"Type your message…\"></textarea>",
        "<button class=\"bot-widget-send\" type=\"button\">➤</button>",
        "</div>"
    ));
    out.push_str("</div>");

    out.push_str(&format!(
        "<button class=\"bot-widget-launcher\" type=\"button\">{}</button>",
        escape_html(&config.launcher_label)
    ));
    out.push_str("</div></div>");
    out
}

/// One message bubble, tagged by role and error state.
pub fn render_bubble(bubble: &Bubble) -> String {
    let error = if bubble.error {
        " data-error=\"true\""
    } else {
        ""
    };
    let body = match &bubble.body {
        BubbleBody::Loading => LOADER.to_string(),
        BubbleBody::Text(text) => escape_html(text),
        BubbleBody::Markup(markup) => markup.clone(),
        BubbleBody::Node(node) => node.to_html(),
    };
    format!(
        "<div class=\"bot-widget-message\" data-role=\"{}\"{}>{}</div>",
        bubble.role.as_str(),
        error,
        body
    )
}
