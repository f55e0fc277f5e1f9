//! Loop parameters: iteration controller tuning.
//!
//! [`LoopParams`] groups the static parameters read by
//! [`RunAgentUseCase`](crate::use_cases::run_agent::RunAgentUseCase) and
//! [`RunShellLoopUseCase`](crate::use_cases::run_shell_loop::RunShellLoopUseCase).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_REPEAT_THRESHOLD: usize = 2;

/// Iteration controller parameters.
///
/// | Loop       | max_iterations | repeat_threshold | auto_execute |
/// |------------|----------------|------------------|--------------|
/// | Tool calls | Yes            | Yes              | No           |
/// | Shell      | No             | No               | Yes          |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopParams {
    /// Maximum number of action batches executed per user turn.
    pub max_iterations: usize,
    /// Consecutive identical single-tool batches before a warning. 0 disables.
    pub repeat_threshold: usize,
    /// Run extracted shell commands without asking.
    pub auto_execute: bool,
}

impl Default for LoopParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            repeat_threshold: DEFAULT_REPEAT_THRESHOLD,
            auto_execute: false,
        }
    }
}

impl LoopParams {
    // ==================== Builder Methods ====================

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_repeat_threshold(mut self, threshold: usize) -> Self {
        self.repeat_threshold = threshold;
        self
    }

    pub fn with_auto_execute(mut self, auto: bool) -> Self {
        self.auto_execute = auto;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = LoopParams::default();
        assert_eq!(params.max_iterations, 10);
        assert_eq!(params.repeat_threshold, 2);
        assert!(!params.auto_execute);
    }

    #[test]
    fn test_builder() {
        let params = LoopParams::default()
            .with_max_iterations(3)
            .with_repeat_threshold(0)
            .with_auto_execute(true);

        assert_eq!(params.max_iterations, 3);
        assert_eq!(params.repeat_threshold, 0);
        assert!(params.auto_execute);
    }
}
