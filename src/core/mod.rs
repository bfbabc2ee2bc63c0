//! # Core Widget Logic
//!
//! This module contains the widget's business logic.
//! It knows nothing about any specific host surface.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • MessageStore (data)  │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │  • render (bubbles)     │
//!                    │                         │
//!                    │  No I/O. No UI. Pure.   │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │    HTML    │      │  Headless  │
//!     │  Surface   │      │  Snapshot  │      │  (--ask)   │
//!     │ (ratatui)  │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: `Message` and the ordered `MessageStore`
//! - [`state`]: `ChatState`, everything one widget instance knows
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`config`]: embed options, defaults and the config file
//! - [`theme`]: the CSS custom properties a surface styles itself with
//! - [`render`]: messages → bubbles, with the renderer failure boundary

pub mod action;
pub mod config;
pub mod message;
pub mod render;
pub mod state;
pub mod theme;
