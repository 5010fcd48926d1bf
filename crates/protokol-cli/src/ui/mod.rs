//! UI primitives for the Protokol CLI.
//!
//! - **Context**: environment detection (TTY, color)
//! - **Mode**: output mode resolution (json, plain, pretty)
//! - **Theme**: badges and ANSI colors
//! - **Render**: tables, headers, key-value lines
//! - **Progress**: batch-operation progress bars

mod context;
mod mode;
pub mod progress;
pub mod render;
pub mod theme;

pub use context::UiContext;
pub use mode::OutputMode;
pub use progress::BatchProgress;
pub use render::{badge, header, kv, table};
pub use theme::Badge;
