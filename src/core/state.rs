//! # Widget State
//!
//! Business state for one widget instance. No surface types here;
//! presentation lives behind the `widget::Surface` trait.
//!
//! ```text
//! ChatState
//! ├── store: MessageStore           // conversation, display order
//! ├── sending: bool                 // a turn is in flight
//! ├── active_turn: Option<MessageId> // placeholder of the in-flight turn
//! └── panel_open: bool              // chat panel expanded
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use crate::core::message::{MessageId, MessageStore};

#[derive(Debug, Default)]
pub struct ChatState {
    pub store: MessageStore,
    pub sending: bool,
    pub active_turn: Option<MessageId>,
    pub panel_open: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `id` is the placeholder of the turn currently in flight.
    pub fn is_active_turn(&self, id: &MessageId) -> bool {
        self.active_turn.as_ref() == Some(id)
    }
}
