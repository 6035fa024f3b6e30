//! # Scheduler Configuration

use crate::{ExecError, ExecResult};
use core::time::Duration;

/// Configuration for a [`crate::Scheduler`] instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pool slots, including the host slot 0
    pub max_threads: usize,
    /// Stack size of every pooled thread (bytes)
    pub stack_size: usize,
    /// Host delay per simulated tick of work
    pub tick_delay: Duration,
}

impl SchedulerConfig {
    /// Default pool size: host + 6 threads
    pub const DEFAULT_MAX_THREADS: usize = 7;
    /// Default stack size: 64 KiB
    pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;
    /// Smallest stack a thread body can be entered on
    pub const MIN_STACK_SIZE: usize = 16 * 1024;

    /// Create default configuration
    pub fn new() -> Self {
        Self {
            max_threads: Self::DEFAULT_MAX_THREADS,
            stack_size: Self::DEFAULT_STACK_SIZE,
            tick_delay: Duration::ZERO,
        }
    }

    /// Configuration matching the classic demo: one host tick per simulated tick
    pub fn reference() -> Self {
        Self {
            tick_delay: Duration::from_millis(10),
            ..Self::new()
        }
    }

    /// Configuration for tests: minimum stacks, no delay
    pub fn testing() -> Self {
        Self {
            stack_size: Self::MIN_STACK_SIZE,
            ..Self::new()
        }
    }

    /// Set the pool size (host slot included)
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    /// Set the per-thread stack size
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Set the host delay per simulated tick
    pub fn with_tick_delay(mut self, tick_delay: Duration) -> Self {
        self.tick_delay = tick_delay;
        self
    }

    /// Number of threads that can be live at once, excluding the host
    pub fn worker_capacity(&self) -> usize {
        self.max_threads.saturating_sub(1)
    }

    /// Check the configuration before building a pool from it
    pub fn validate(&self) -> ExecResult<()> {
        if self.max_threads < 2 {
            return Err(ExecError::InvalidConfig("max_threads must leave room for one thread besides the host"));
        }
        if self.stack_size < Self::MIN_STACK_SIZE {
            return Err(ExecError::InvalidConfig("stack_size is below the minimum"));
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_threads, 7);
        assert_eq!(config.worker_capacity(), 6);
        assert_eq!(config.tick_delay, Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(SchedulerConfig::reference().validate().is_ok());
        assert!(SchedulerConfig::testing().validate().is_ok());
        assert_eq!(SchedulerConfig::reference().tick_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_validate_rejects() {
        let host_only = SchedulerConfig::new().with_max_threads(1);
        assert!(matches!(host_only.validate(), Err(ExecError::InvalidConfig(_))));

        let tiny_stack = SchedulerConfig::new().with_stack_size(512);
        assert!(matches!(tiny_stack.validate(), Err(ExecError::InvalidConfig(_))));
    }
}
