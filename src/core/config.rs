//! # Configuration
//!
//! Centralizes all widget settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.bot-widget/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! Embed options arrive sparse (`WidgetOptions`, every field optional) and are
//! collapsed into a `WidgetConfig` with concrete values. Empty strings count
//! as unset, so a host passing `title: ""` still gets the default title.

use clap::ValueEnum;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::render::MarkdownRenderer;
use crate::transport::Endpoint;

// ============================================================================
// Option Structs (all fields Option<T> for sparse TOML / embed objects)
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    #[default]
    BottomRight,
    BottomLeft,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::BottomRight => "bottom-right",
            Position::BottomLeft => "bottom-left",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a host page passes to `init`. Accepts both the snake_case names used
/// in the TOML file and the camelCase names of the embed API.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WidgetOptions {
    #[serde(default, alias = "chatbotId")]
    pub chatbot_id: Option<String>,
    #[serde(default, alias = "apiBaseUrl")]
    pub api_base_url: Option<String>,
    #[serde(default, alias = "launcherLabel")]
    pub launcher_label: Option<String>,
    #[serde(default)]
    pub theme: Option<Theme>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "welcomeMessage")]
    pub welcome_message: Option<String>,
    #[serde(default, alias = "accentColor")]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default, alias = "panelHeight")]
    pub panel_height: Option<u32>,
    /// Host-supplied content renderer. Code only, never read from files.
    #[serde(skip)]
    pub markdown_renderer: Option<MarkdownRenderer>,
}

impl WidgetOptions {
    /// Layers `top` over `self`: every field set in `top` wins.
    pub fn overlay(self, top: WidgetOptions) -> WidgetOptions {
        WidgetOptions {
            chatbot_id: top.chatbot_id.or(self.chatbot_id),
            api_base_url: top.api_base_url.or(self.api_base_url),
            launcher_label: top.launcher_label.or(self.launcher_label),
            theme: top.theme.or(self.theme),
            title: top.title.or(self.title),
            welcome_message: top.welcome_message.or(self.welcome_message),
            accent_color: top.accent_color.or(self.accent_color),
            subtitle: top.subtitle.or(self.subtitle),
            position: top.position.or(self.position),
            panel_height: top.panel_height.or(self.panel_height),
            markdown_renderer: top.markdown_renderer.or(self.markdown_renderer),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BotWidgetConfig {
    #[serde(default)]
    pub widget: WidgetOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub file: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_LAUNCHER_LABEL: &str = "Chat with us";
pub const DEFAULT_TITLE: &str = "Assistant";
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hi there! I’m here to help. Ask me anything about our services.";
pub const DEFAULT_SUBTITLE: &str = "Powered by Bot Studio";
pub const DEFAULT_ACCENT_COLOR: &str = "#2563eb";
pub const DEFAULT_PANEL_HEIGHT: u32 = 640;
pub const DEFAULT_LOG_FILE: &str = "bot-widget.log";

pub const ENV_CHATBOT_ID: &str = "BOT_WIDGET_CHATBOT_ID";
pub const ENV_API_BASE_URL: &str = "BOT_WIDGET_API_BASE_URL";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub chatbot_id: String,
    pub api_base_url: String,
    pub endpoint: Endpoint,
    pub launcher_label: String,
    pub theme: Theme,
    pub title: String,
    pub welcome_message: String,
    pub accent_color: String,
    pub subtitle: String,
    pub position: Position,
    pub panel_height: u32,
    pub markdown_renderer: Option<MarkdownRenderer>,
}

impl WidgetConfig {
    /// Validates required options and fills in defaults.
    pub fn from_options(options: WidgetOptions) -> Result<Self, ConfigError> {
        let chatbot_id = non_empty(options.chatbot_id).ok_or(ConfigError::MissingChatbotId)?;
        let api_base_url =
            non_empty(options.api_base_url).ok_or(ConfigError::MissingApiBaseUrl)?;
        let endpoint = Endpoint::new(&api_base_url, &chatbot_id)
            .map_err(|e| ConfigError::InvalidApiBaseUrl(e.to_string()))?;

        Ok(Self {
            chatbot_id,
            api_base_url,
            endpoint,
            launcher_label: or_default(options.launcher_label, DEFAULT_LAUNCHER_LABEL),
            theme: options.theme.unwrap_or_default(),
            title: or_default(options.title, DEFAULT_TITLE),
            welcome_message: or_default(options.welcome_message, DEFAULT_WELCOME_MESSAGE),
            accent_color: or_default(options.accent_color, DEFAULT_ACCENT_COLOR),
            subtitle: or_default(options.subtitle, DEFAULT_SUBTITLE),
            position: options.position.unwrap_or_default(),
            panel_height: options
                .panel_height
                .filter(|h| *h > 0)
                .unwrap_or(DEFAULT_PANEL_HEIGHT),
            markdown_renderer: options.markdown_renderer,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn or_default(value: Option<String>, default: &str) -> String {
    non_empty(value).unwrap_or_else(|| default.to_string())
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    MissingChatbotId,
    MissingApiBaseUrl,
    InvalidApiBaseUrl(String),
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingChatbotId => write!(f, "Chatbot ID is required"),
            ConfigError::MissingApiBaseUrl => write!(f, "API base URL is required"),
            ConfigError::InvalidApiBaseUrl(e) => write!(f, "{e}"),
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.bot-widget/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".bot-widget").join("config.toml"))
}

/// Load config from `~/.bot-widget/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `BotWidgetConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<BotWidgetConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(BotWidgetConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<BotWidgetConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(BotWidgetConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: BotWidgetConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG_FILE: &str = r##"# Bot Widget Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [widget]
# chatbot_id = "my-bot"                      # Or set BOT_WIDGET_CHATBOT_ID
# api_base_url = "http://localhost:8000"     # Or set BOT_WIDGET_API_BASE_URL
# launcher_label = "Chat with us"
# theme = "light"                            # "light" or "dark"
# title = "Assistant"
# subtitle = "Powered by Bot Studio"
# welcome_message = "Hi there! I’m here to help. Ask me anything about our services."
# accent_color = "#2563eb"
# position = "bottom-right"                  # "bottom-right" or "bottom-left"
# panel_height = 640

# [logging]
# level = "debug"                            # "error", "warn", "info", "debug", "trace"
# file = "bot-widget.log"
"##;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_FILE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Reads the widget options carried by environment variables.
pub fn options_from_env() -> WidgetOptions {
    WidgetOptions {
        chatbot_id: std::env::var(ENV_CHATBOT_ID).ok(),
        api_base_url: std::env::var(ENV_API_BASE_URL).ok(),
        ..Default::default()
    }
}

/// Collapses file → env → CLI into one set of options.
pub fn layer(file: &BotWidgetConfig, env: WidgetOptions, cli: WidgetOptions) -> WidgetOptions {
    file.widget.clone().overlay(env).overlay(cli)
}

/// Resolve the final widget config: defaults → config file → env vars → CLI.
pub fn resolve(file: &BotWidgetConfig, cli: WidgetOptions) -> Result<WidgetConfig, ConfigError> {
    WidgetConfig::from_options(layer(file, options_from_env(), cli))
}
