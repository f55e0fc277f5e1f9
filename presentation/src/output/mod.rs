//! Console output formatting

pub mod console;

pub use console::{ConsoleFormatter, LineStyle, MAX_DISPLAY_LINES, line_style};
