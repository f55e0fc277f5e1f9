//! Application-level configuration.
//!
//! - [`LoopParams`]: iteration cap, repeat heuristic, auto-execute

pub mod loop_params;

pub use loop_params::LoopParams;
