//! CLI styling utilities for terminal output.
//!
//! Provides semantic colors, output helpers, and formatted tables. chainbreak
//! is a single-shot synchronous tool with no long-running operation to
//! animate, so there is no spinner, and no persistent banner since every
//! invocation dumps and exits.

use std::sync::atomic::{AtomicBool, Ordering};

pub mod colors;
pub mod output;
pub mod table;

pub use output::*;
pub use table::*;

/// Global flag to track if colors are disabled.
static NO_COLOR: AtomicBool = AtomicBool::new(false);

/// Sets the global no-color flag.
pub fn set_no_color(value: bool) {
    NO_COLOR.store(value, Ordering::SeqCst);
}

/// Checks if colors are disabled.
pub fn no_color() -> bool {
    NO_COLOR.load(Ordering::SeqCst)
}
