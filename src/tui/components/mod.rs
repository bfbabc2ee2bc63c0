//! # TUI Components
//!
//! ```text
//! components/
//! ├── mod.rs          (this file)
//! ├── header.rs       (Panel title + subtitle)
//! ├── bubble_list.rs  (Scrollable message bubbles)
//! ├── input_line.rs   (Text input, emits Submit)
//! └── launcher.rs     (The pill that opens the panel)
//! ```
//!
//! Stateless components (`PanelHeader`, `Launcher`, `BubbleList`) are built
//! fresh each frame from props. `InputLine` owns its buffer across frames.

pub mod bubble_list;
pub mod header;
pub mod input_line;
pub mod launcher;

pub use bubble_list::BubbleList;
pub use header::PanelHeader;
pub use input_line::{InputEvent, InputLine};
pub use launcher::Launcher;
