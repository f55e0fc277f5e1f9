//! Line-level diff engine used to report file mutations.

pub mod engine;
pub mod render;

pub use engine::{DiffEntry, DiffKind, apply_new, apply_old, compute_diff, split_lines};
pub use render::{format_change, render_create, render_diff};
