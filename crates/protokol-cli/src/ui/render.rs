//! Rendering primitives for CLI output.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL};
use comfy_table::{Cell, ContentArrangement, Table};

use super::context::UiContext;
use super::theme::{colors, styled, Badge};

/// Render a badge with a message, e.g. "[OK] Entry added".
pub fn badge(ctx: &UiContext, kind: Badge, message: &str) -> String {
    let colored = styled(kind.text(), kind.style(), ctx.color);
    if message.is_empty() {
        colored
    } else {
        format!("{} {}", colored, message)
    }
}

/// Render a key-value pair with a dim key.
pub fn kv(ctx: &UiContext, key: &str, value: &str) -> String {
    let styled_key = styled(&format!("{}:", key), colors::DIM, ctx.color);
    format!("{} {}", styled_key, value)
}

/// Render a header line for a command.
pub fn header(ctx: &UiContext, command: &str, context: Option<&str>) -> String {
    let title = styled("Protokol", colors::BOLD, ctx.color);
    match context {
        Some(c) => format!("{} \u{00B7} {} ({})", title, command, c),
        None => format!("{} \u{00B7} {}", title, command),
    }
}

/// Build a table in the active mode's preset: rounded UTF-8 boxes on a
/// TTY, markdown-ish ASCII otherwise.
pub fn table(ctx: &UiContext, columns: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut table = Table::new();
    if ctx.mode.is_pretty() {
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(ASCII_MARKDOWN);
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(columns.iter().map(|c| Cell::new(c)).collect::<Vec<_>>());
    for row in rows {
        table.add_row(row);
    }
    table.to_string()
}
