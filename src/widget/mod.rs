//! # Widget Controller
//!
//! Orchestrates one widget instance: user input becomes an `Action`, the
//! core reducer mutates the message store, the resulting `Effect` starts a
//! turn or refreshes the surface.
//!
//! ```text
//!   submit(text) ──► update() ──► SpawnTurn ──► tokio task
//!                                                  │ stream_chat()
//!   pump() ◄──────── mpsc<Action> ◄────────────────┘ Delta / Completed / Failed
//!     │
//!     └──► update() ──► Render ──► Surface::render(bubbles)
//! ```
//!
//! Every action the turn task sends is tagged with the placeholder's id.
//! `destroy()` aborts the task and clears the store, so anything still in
//! flight is discarded by the reducer. A turn task that panics is reported
//! as a failed turn by a watcher, so the sending flag always clears.

pub mod console;
pub mod html;
pub mod markdown;
pub mod registry;
pub mod surface;

pub use registry::WidgetRegistry;
pub use surface::{MemorySurface, Surface};

use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{AbortHandle, JoinHandle};

use crate::core::action::{Action, Effect, TurnRequest, update};
use crate::core::config::{ConfigError, WidgetConfig, WidgetOptions};
use crate::core::message::{Message, MessageId};
use crate::core::render::{Bubble, render_messages};
use crate::core::state::ChatState;
use crate::transport::{ChatTransport, HttpTransport};

/// Reason shown when a turn cannot be started at all.
const NO_RUNTIME: &str = "No async runtime available to send the message.";
/// Reason shown when the turn task dies without an outcome.
const TURN_PANICKED: &str = "The reply stopped unexpectedly.";

pub struct Widget<S: Surface> {
    config: WidgetConfig,
    transport: Arc<dyn ChatTransport>,
    state: ChatState,
    surface: S,
    mounted: bool,
    tx: UnboundedSender<Action>,
    rx: UnboundedReceiver<Action>,
    turn: Option<AbortHandle>,
}

impl<S: Surface> Widget<S> {
    /// Validates `options` and builds a widget talking HTTP to the configured backend.
    pub fn new(options: WidgetOptions, surface: S) -> Result<Self, ConfigError> {
        let config = WidgetConfig::from_options(options)?;
        let transport = Arc::new(HttpTransport::new(config.endpoint.clone()));
        Ok(Self::from_config(config, transport, surface))
    }

    pub fn with_transport(
        options: WidgetOptions,
        transport: Arc<dyn ChatTransport>,
        surface: S,
    ) -> Result<Self, ConfigError> {
        let config = WidgetConfig::from_options(options)?;
        Ok(Self::from_config(config, transport, surface))
    }

    pub fn from_config(config: WidgetConfig, transport: Arc<dyn ChatTransport>, surface: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            transport,
            state: ChatState::new(),
            surface,
            mounted: false,
            tx,
            rx,
            turn: None,
        }
    }

    /// Builds the surface and shows the welcome message. Mounting twice is a no-op.
    pub fn mount(&mut self) {
        if self.mounted {
            debug!("Widget for chatbot {} already mounted", self.config.chatbot_id);
            return;
        }
        info!(
            "Mounting widget: chatbot={}, transport={}, theme={}, position={}",
            self.config.chatbot_id,
            self.transport.name(),
            self.config.theme,
            self.config.position
        );
        self.surface.mount(&self.config);
        self.mounted = true;
        self.state.panel_open = false;
        let welcome = self.config.welcome_message.clone();
        self.dispatch(Action::Greet(welcome));
    }

    /// Aborts any in-flight turn, clears the conversation and tears down the surface.
    pub fn destroy(&mut self) {
        if let Some(turn) = self.turn.take() {
            info!("Aborting in-flight turn on destroy");
            turn.abort();
        }
        self.dispatch(Action::Clear);
        while self.rx.try_recv().is_ok() {}
        self.state.panel_open = false;
        if self.mounted {
            self.surface.unmount();
            self.mounted = false;
            info!("Widget for chatbot {} destroyed", self.config.chatbot_id);
        }
    }

    /// Opens, closes (`Some`) or flips (`None`) the chat panel.
    pub fn toggle_panel(&mut self, force: Option<bool>) {
        if !self.mounted {
            return;
        }
        self.dispatch(Action::TogglePanel(force));
    }

    /// Submits user input. Returns true if a turn was started, in which case
    /// the host should clear its input field.
    ///
    /// Returns false when the input was ignored, and also when the turn failed
    /// before anything was sent (no tokio runtime). In that case the message
    /// and its error reply are already in the conversation.
    pub fn submit(&mut self, text: &str) -> bool {
        if !self.mounted {
            debug!("Submit ignored: widget not mounted");
            return false;
        }
        matches!(self.dispatch(Action::Submit(text.to_string())), DispatchOutcome::Turn)
    }

    /// Applies every action the turn task has sent so far. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.rx.try_recv() {
            self.apply(action);
            applied += 1;
        }
        applied
    }

    /// Waits for the next action from the in-flight turn and applies it.
    ///
    /// Returns false when no turn is in flight and nothing is queued.
    pub async fn step(&mut self) -> bool {
        if !self.state.sending {
            return self.pump() > 0;
        }
        match self.rx.recv().await {
            Some(action) => {
                self.apply(action);
                true
            }
            None => false,
        }
    }

    /// Drives the in-flight turn, if any, to completion.
    pub async fn settle(&mut self) {
        while self.state.sending {
            if !self.step().await {
                break;
            }
        }
        self.pump();
    }

    pub fn messages(&self) -> &[Message] {
        self.state.store.as_slice()
    }

    pub fn is_sending(&self) -> bool {
        self.state.sending
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_panel_open(&self) -> bool {
        self.state.panel_open
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The bubbles the surface currently shows.
    pub fn bubbles(&self) -> Vec<Bubble> {
        render_messages(
            self.state.store.as_slice(),
            self.config.markdown_renderer.as_ref(),
        )
    }

    /// Standalone HTML document of the widget as it looks right now.
    pub fn to_html(&self) -> String {
        html::render_document(&self.config, &self.bubbles(), self.state.panel_open)
    }

    fn apply(&mut self, action: Action) {
        let ends_turn = match &action {
            Action::Completed { id, .. } | Action::Failed { id, .. } => {
                self.state.is_active_turn(id)
            }
            _ => false,
        };
        self.dispatch(action);
        if ends_turn {
            self.turn = None;
        }
    }

    fn dispatch(&mut self, action: Action) -> DispatchOutcome {
        match update(&mut self.state, action) {
            Effect::None => DispatchOutcome::Ignored,
            Effect::Render => {
                self.refresh();
                DispatchOutcome::Applied
            }
            Effect::Panel(open) => {
                self.surface.set_panel_open(open);
                DispatchOutcome::Applied
            }
            Effect::SpawnTurn(turn) => {
                self.refresh();
                if self.spawn_turn(turn) {
                    DispatchOutcome::Turn
                } else {
                    DispatchOutcome::Applied
                }
            }
        }
    }

    fn refresh(&mut self) {
        if !self.mounted {
            return;
        }
        let bubbles = self.bubbles();
        self.surface.render(&bubbles);
    }

    /// Starts the turn task. Returns false if the turn failed immediately.
    fn spawn_turn(&mut self, turn: TurnRequest) -> bool {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Cannot start turn: {}", e);
                self.dispatch(Action::Failed {
                    id: turn.assistant_id,
                    reason: NO_RUNTIME.to_string(),
                });
                return false;
            }
        };
        info!(
            "Spawning chat turn: placeholder={}, history_count={}",
            turn.assistant_id,
            turn.request.history.len()
        );
        let id = turn.assistant_id.clone();
        let task = runtime.spawn(run_turn(self.transport.clone(), turn, self.tx.clone()));
        self.turn = Some(task.abort_handle());
        runtime.spawn(watch_turn(task, id, self.tx.clone()));
        true
    }
}

enum DispatchOutcome {
    Ignored,
    Applied,
    Turn,
}

/// One streamed exchange. Forwards deltas as they decode, then the outcome.
async fn run_turn(transport: Arc<dyn ChatTransport>, turn: TurnRequest, tx: UnboundedSender<Action>) {
    let TurnRequest {
        assistant_id,
        request,
    } = turn;

    let delta_tx = tx.clone();
    let delta_id = assistant_id.clone();
    let mut on_delta = move |text: &str| {
        let action = Action::Delta {
            id: delta_id.clone(),
            text: text.to_string(),
        };
        if delta_tx.send(action).is_err() {
            debug!("Dropping delta: widget is gone");
        }
    };

    let outcome = match transport.stream_chat(&request, &mut on_delta).await {
        Ok(payload) => Action::Completed {
            id: assistant_id,
            payload,
        },
        Err(e) => {
            warn!("Chat turn failed: {}", e);
            Action::Failed {
                id: assistant_id,
                reason: e.to_string(),
            }
        }
    };

    if tx.send(outcome).is_err() {
        warn!("Failed to deliver turn outcome: widget is gone");
    }
}

/// Turns a panicked turn task into a failed turn. Cancellation stays silent.
async fn watch_turn(task: JoinHandle<()>, id: MessageId, tx: UnboundedSender<Action>) {
    match task.await {
        Ok(()) => {}
        Err(e) if e.is_panic() => {
            error!("Chat turn for {} panicked", id);
            let action = Action::Failed {
                id,
                reason: TURN_PANICKED.to_string(),
            };
            if tx.send(action).is_err() {
                debug!("Dropping turn failure: widget is gone");
            }
        }
        Err(_) => debug!("Chat turn for {} cancelled", id),
    }
}
