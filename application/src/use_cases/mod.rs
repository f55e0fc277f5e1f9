//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod conversation;
pub mod run_agent;
pub mod run_shell_loop;
pub mod safety;
pub(crate) mod shared;

#[cfg(test)]
pub(crate) mod test_support;
