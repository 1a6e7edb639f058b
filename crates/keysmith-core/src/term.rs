//! Terminal detection.

use std::io::{self, IsTerminal};

/// Check if stderr is attached to a terminal.
pub fn in_controlling_terminal() -> bool {
    io::stderr().is_terminal()
}
