use std::error::Error;
use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

use bot_widget::core::config::{
    self, DEFAULT_LOG_FILE, Position, Theme, WidgetConfig, WidgetOptions,
};
use bot_widget::core::render::MarkdownRenderer;
use bot_widget::transport::{HttpTransport, Role};
use bot_widget::tui::{self, TerminalSurface};
use bot_widget::widget::console::ConsoleSurface;
use bot_widget::widget::{Widget, WidgetRegistry, markdown};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

/// How assistant replies are turned into rich content.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum MarkdownMode {
    /// Render to an HTML string
    Html,
    /// Render to an element tree
    Tree,
}

impl MarkdownMode {
    fn renderer(self) -> MarkdownRenderer {
        match self {
            MarkdownMode::Html => markdown::html_renderer(),
            MarkdownMode::Tree => markdown::tree_renderer(),
        }
    }
}

#[derive(Parser)]
#[command(name = "bot-widget", about = "Chat widget for a hosted knowledge-base bot")]
struct Args {
    /// Chatbot to talk to (or BOT_WIDGET_CHATBOT_ID)
    #[arg(long)]
    chatbot_id: Option<String>,
    /// Backend origin, e.g. http://localhost:8000 (or BOT_WIDGET_API_BASE_URL)
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long, value_enum)]
    theme: Option<Theme>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    subtitle: Option<String>,
    #[arg(long)]
    welcome_message: Option<String>,
    #[arg(long)]
    launcher_label: Option<String>,
    /// Accent colour as a CSS colour
    #[arg(long)]
    accent_color: Option<String>,
    #[arg(long, value_enum)]
    position: Option<Position>,
    /// Panel height in pixels
    #[arg(long)]
    panel_height: Option<u32>,
    /// Render assistant replies as markdown
    #[arg(long, value_enum)]
    markdown: Option<MarkdownMode>,
    /// Ask one question, stream the answer to stdout and exit
    #[arg(long)]
    ask: Option<String>,
    /// Check that the chatbot is ready and exit
    #[arg(long)]
    health: bool,
    /// Write an HTML snapshot of the widget to this file on exit
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Log level: error, warn, info, debug or trace
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn options(&self) -> WidgetOptions {
        WidgetOptions {
            chatbot_id: self.chatbot_id.clone(),
            api_base_url: self.api_base_url.clone(),
            launcher_label: self.launcher_label.clone(),
            theme: self.theme,
            title: self.title.clone(),
            welcome_message: self.welcome_message.clone(),
            accent_color: self.accent_color.clone(),
            subtitle: self.subtitle.clone(),
            position: self.position,
            panel_height: self.panel_height,
            markdown_renderer: self.markdown.map(MarkdownMode::renderer),
        }
    }
}

fn init_logging(level: Option<&str>, file: &str) {
    let level = match level.map(str::parse::<LevelFilter>) {
        Some(Ok(level)) => level,
        Some(Err(_)) | None => LevelFilter::Debug,
    };
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(file) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }
}

async fn check_health(config: &WidgetConfig) -> Result<(), Box<dyn Error>> {
    let transport = HttpTransport::new(config.endpoint.clone());
    let status = transport.health().await?;
    println!(
        "{}: {} ({} chunks indexed)",
        status.chatbot_id,
        if status.ready { "ready" } else { "not ready" },
        status.chunks_indexed
    );
    Ok(())
}

async fn ask(options: WidgetOptions, question: &str, snapshot: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut surface = ConsoleSurface::new(stdout());
    // The welcome message is not part of the answer
    surface.mark_seen(1);
    let mut widget = Widget::new(options, surface)?;
    widget.mount();
    if !widget.submit(question) {
        widget.destroy();
        return Err("nothing to ask: the question is empty".into());
    }
    widget.settle().await;

    if let Some(answer) = widget.messages().last().filter(|m| m.role == Role::Assistant) {
        let sources = answer.sources.as_deref().unwrap_or_default();
        if !sources.is_empty() {
            println!();
            println!("Sources:");
            for source in sources {
                let name = source.filename.as_deref().unwrap_or("unknown document");
                match source.score {
                    Some(score) => println!("  - {name} (score {score:.2})"),
                    None => println!("  - {name}"),
                }
            }
        }
    }
    if let Some(path) = snapshot {
        write_snapshot(&widget.to_html(), path);
    }
    widget.destroy();
    Ok(())
}

fn write_snapshot(html: &str, path: &PathBuf) {
    match std::fs::write(path, html) {
        Ok(()) => info!("Wrote snapshot to {}", path.display()),
        Err(e) => warn!("Failed to write snapshot to {}: {}", path.display(), e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config();
    let (log_level, log_file) = match &file_config {
        Ok(c) => (c.logging.level.clone(), c.logging.file.clone()),
        Err(_) => (None, None),
    };
    init_logging(
        args.log_level.as_deref().or(log_level.as_deref()),
        log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE),
    );
    let file_config = file_config.inspect_err(|e| error!("Config error: {}", e))?;

    let options = config::layer(&file_config, config::options_from_env(), args.options());
    let resolved = WidgetConfig::from_options(options.clone())?;
    info!(
        "Bot widget starting: chatbot={}, backend={}",
        resolved.chatbot_id, resolved.api_base_url
    );

    if args.health {
        return check_health(&resolved).await;
    }
    if let Some(question) = &args.ask {
        return ask(options, question, args.snapshot.as_ref()).await;
    }

    let mut registry = WidgetRegistry::new();
    let transport = Arc::new(HttpTransport::new(resolved.endpoint.clone()));
    let widget = registry.init_with_transport(options, transport, TerminalSurface::new())?;
    let result = tui::run(widget);
    if let Some(path) = &args.snapshot {
        write_snapshot(&widget.to_html(), path);
    }
    registry.destroy_all();
    result?;
    Ok(())
}
