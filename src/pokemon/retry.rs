use crate::error::Error;

/// Bounded retry for the primary detail fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first one
  pub max_attempts: u32,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self { max_attempts: 2 }
  }
}

impl RetryPolicy {
  /// A policy that never retries.
  pub fn no_retry() -> Self {
    Self { max_attempts: 1 }
  }

  /// Check if another attempt may follow failed attempt number `attempt` (1-based).
  pub fn should_retry(&self, attempt: u32, error: &Error) -> bool {
    !error.is_not_found() && attempt < self.max_attempts
  }
}
