//! # Actions
//!
//! Everything that can happen to a widget becomes an `Action`.
//! User submits text? That's `Action::Submit(text)`.
//! A delta arrives? That's `Action::Delta { id, text }`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns the `Effect` the controller must carry out.
//! No I/O here.
//!
//! ```text
//! State + Action  →  update()  →  Effect
//! ```
//!
//! Per turn: `Idle → Sending → Streaming → Settled → Idle`. Only one turn is
//! in flight; a submit while sending is ignored, not queued.

use log::debug;

use crate::core::message::{HISTORY_LIMIT, Message, MessageId};
use crate::core::state::ChatState;
use crate::transport::{ChatRequest, ChatResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Show the welcome text as the first assistant message.
    Greet(String),
    /// User submitted input.
    Submit(String),
    /// A streamed fragment for the turn whose placeholder is `id`.
    Delta { id: MessageId, text: String },
    /// The turn finished with the server's canonical payload.
    Completed { id: MessageId, payload: ChatResponse },
    /// The turn failed; `reason` is user-facing.
    Failed { id: MessageId, reason: String },
    /// Open, close (`Some`) or flip (`None`) the chat panel.
    TogglePanel(Option<bool>),
    /// Drop the whole conversation.
    Clear,
}

/// What the controller must do after an update.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Nothing changed.
    None,
    /// Messages changed; re-render them.
    Render,
    /// Panel visibility changed.
    Panel(bool),
    /// Messages changed and a turn must be started.
    SpawnTurn(TurnRequest),
}

/// A turn ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRequest {
    /// Placeholder that receives the reply.
    pub assistant_id: MessageId,
    pub request: ChatRequest,
}

pub fn update(state: &mut ChatState, action: Action) -> Effect {
    match action {
        Action::Greet(text) => {
            if text.is_empty() {
                return Effect::None;
            }
            state.store.push(Message::assistant(text));
            Effect::Render
        }
        Action::Submit(text) => {
            let content = text.trim();
            if content.is_empty() {
                return Effect::None;
            }
            if state.sending {
                debug!("Submit ignored: a turn is already in flight");
                return Effect::None;
            }

            state.store.push(Message::user(content));
            let assistant_id = state.store.push(Message::placeholder()).id.clone();
            state.sending = true;
            state.active_turn = Some(assistant_id.clone());

            // The fresh placeholder is empty and never qualifies
            let history = state.store.history_window(HISTORY_LIMIT);
            Effect::SpawnTurn(TurnRequest {
                assistant_id,
                request: ChatRequest {
                    message: content.to_string(),
                    history,
                },
            })
        }
        Action::Delta { id, text } => {
            if !state.is_active_turn(&id) {
                debug!("Dropping delta for inactive turn {}", id);
                return Effect::None;
            }
            state.store.append(&id, &text);
            Effect::Render
        }
        Action::Completed { id, payload } => {
            if !state.is_active_turn(&id) {
                debug!("Dropping completion for inactive turn {}", id);
                return Effect::None;
            }
            state.store.settle(&id, payload);
            state.sending = false;
            state.active_turn = None;
            Effect::Render
        }
        Action::Failed { id, reason } => {
            if !state.is_active_turn(&id) {
                debug!("Dropping failure for inactive turn {}", id);
                return Effect::None;
            }
            state.store.fail(&id, &reason);
            state.sending = false;
            state.active_turn = None;
            Effect::Render
        }
        Action::TogglePanel(force) => {
            let open = force.unwrap_or(!state.panel_open);
            state.panel_open = open;
            Effect::Panel(open)
        }
        Action::Clear => {
            state.store.clear();
            state.sending = false;
            state.active_turn = None;
            Effect::Render
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Role;

    fn submit(state: &mut ChatState, text: &str) -> TurnRequest {
        match update(state, Action::Submit(text.to_string())) {
            Effect::SpawnTurn(turn) => turn,
            other => panic!("Expected SpawnTurn, got {:?}", other),
        }
    }

    #[test]
    fn test_submit_appends_user_and_placeholder() {
        let mut state = ChatState::new();
        let turn = submit(&mut state, "  Hello  ");

        let messages = state.store.as_slice();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(messages[1].pending);
        assert_eq!(messages[1].id, turn.assistant_id);
        assert!(state.sending);
        assert_eq!(turn.request.message, "Hello");
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut state = ChatState::new();
        assert_eq!(update(&mut state, Action::Submit("   \n".to_string())), Effect::None);
        assert!(state.store.is_empty());
        assert!(!state.sending);
    }

    #[test]
    fn test_second_submit_while_sending_is_noop() {
        let mut state = ChatState::new();
        submit(&mut state, "first");
        let len = state.store.len();

        let effect = update(&mut state, Action::Submit("second".to_string()));
        assert_eq!(effect, Effect::None);
        assert_eq!(state.store.len(), len);
        assert_eq!(state.store.pending_count(), 1);
    }

    #[test]
    fn test_happy_path_streams_then_settles() {
        let mut state = ChatState::new();
        let id = submit(&mut state, "Hello").assistant_id;

        update(&mut state, Action::Delta { id: id.clone(), text: "Hi".to_string() });
        let reply = state.store.get(&id).unwrap();
        assert_eq!(reply.content, "Hi");
        assert!(!reply.pending);

        update(&mut state, Action::Delta { id: id.clone(), text: " there".to_string() });
        assert_eq!(state.store.get(&id).unwrap().content, "Hi there");

        let effect = update(
            &mut state,
            Action::Completed {
                id: id.clone(),
                payload: ChatResponse {
                    response: "Hi there!".to_string(),
                    sources: Some(vec![]),
                    chunks_used: None,
                },
            },
        );
        assert_eq!(effect, Effect::Render);
        let reply = state.store.get(&id).unwrap();
        assert_eq!(reply.content, "Hi there!");
        assert_eq!(reply.sources, Some(vec![]));
        assert!(!state.sending);
        assert!(state.active_turn.is_none());
    }

    #[test]
    fn test_failure_marks_error_and_releases_guard() {
        let mut state = ChatState::new();
        let id = submit(&mut state, "Hello").assistant_id;
        update(
            &mut state,
            Action::Failed {
                id: id.clone(),
                reason: "HTTP 502".to_string(),
            },
        );
        let reply = state.store.get(&id).unwrap();
        assert!(reply.error);
        assert!(!reply.pending);
        assert_eq!(reply.content, "Failed to fetch reply. HTTP 502");
        assert!(!state.sending);

        // Retry is possible right away
        assert!(matches!(
            update(&mut state, Action::Submit("again".to_string())),
            Effect::SpawnTurn(_)
        ));
    }

    #[test]
    fn test_events_for_stale_turn_are_dropped() {
        let mut state = ChatState::new();
        let id = submit(&mut state, "Hello").assistant_id;
        update(&mut state, Action::Clear);

        assert_eq!(
            update(&mut state, Action::Delta { id: id.clone(), text: "late".to_string() }),
            Effect::None
        );
        assert_eq!(
            update(
                &mut state,
                Action::Completed {
                    id,
                    payload: ChatResponse::default()
                }
            ),
            Effect::None
        );
        assert!(state.store.is_empty());
    }

    #[test]
    fn test_history_after_twelve_exchanges() {
        let mut state = ChatState::new();
        for i in 0..12 {
            let id = submit(&mut state, &format!("q{i}")).assistant_id;
            update(
                &mut state,
                Action::Completed {
                    id,
                    payload: ChatResponse {
                        response: format!("a{i}"),
                        ..Default::default()
                    },
                },
            );
        }

        let turn = submit(&mut state, "q12");
        let history: Vec<(Role, &str)> = turn
            .request
            .history
            .iter()
            .map(|h| (h.role, h.content.as_str()))
            .collect();
        assert_eq!(history.len(), 10);
        assert_eq!(
            history,
            vec![
                (Role::Assistant, "a7"),
                (Role::User, "q8"),
                (Role::Assistant, "a8"),
                (Role::User, "q9"),
                (Role::Assistant, "a9"),
                (Role::User, "q10"),
                (Role::Assistant, "a10"),
                (Role::User, "q11"),
                (Role::Assistant, "a11"),
                (Role::User, "q12"),
            ]
        );
    }

    #[test]
    fn test_greet_pushes_assistant_message() {
        let mut state = ChatState::new();
        assert_eq!(update(&mut state, Action::Greet("Welcome!".to_string())), Effect::Render);
        assert_eq!(state.store.as_slice()[0].role, Role::Assistant);
        assert_eq!(update(&mut state, Action::Greet(String::new())), Effect::None);
        assert_eq!(state.store.len(), 1);
    }

    #[test]
    fn test_toggle_panel() {
        let mut state = ChatState::new();
        assert_eq!(update(&mut state, Action::TogglePanel(None)), Effect::Panel(true));
        assert_eq!(update(&mut state, Action::TogglePanel(None)), Effect::Panel(false));
        assert_eq!(update(&mut state, Action::TogglePanel(Some(false))), Effect::Panel(false));
        assert_eq!(update(&mut state, Action::TogglePanel(Some(true))), Effect::Panel(true));
        assert!(state.panel_open);
    }
}
