//! Prometheus text exposition format (0.0.4).
//!
//! `parse_text` turns a text block into families; `render_text` writes them
//! back. Counters are keyed without their `_total` suffix on the way in and
//! get it back in the `# HELP`/`# TYPE` preamble on the way out.

mod parse;
mod render;

pub use parse::parse_text;
pub use render::{format_value, render_text};
