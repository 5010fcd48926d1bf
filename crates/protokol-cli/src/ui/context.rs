//! Environment detection for output rendering.

use std::io::IsTerminal;

use super::mode::OutputMode;

/// Resolved UI environment: output mode plus color capability.
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    pub mode: OutputMode,
    pub color: bool,
}

impl UiContext {
    /// Detect the environment for a command invocation.
    ///
    /// `NO_COLOR` disables colors regardless of mode.
    pub fn from_env(json_flag: bool) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        let term_is_dumb = std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false);
        let mode = OutputMode::resolve(json_flag, is_tty, term_is_dumb);
        let color = mode.is_pretty() && std::env::var_os("NO_COLOR").is_none();
        Self { mode, color }
    }
}
