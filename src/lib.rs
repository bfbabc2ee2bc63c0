//! Bot widget library exports

pub mod core;
pub mod transport;
pub mod tui;
pub mod widget;

#[cfg(test)]
pub mod test_support;
