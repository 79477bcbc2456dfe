//! # Queue construction options.
//!
//! [`QueueConfig`] carries the two admission limits and the queue name.
//! Both limits are optional:
//!
//! - neither given → both default to 1;
//! - only one given → the other copies its value.
//!
//! Validation happens once, at queue construction:
//!
//! - any provided limit must be at least 1;
//! - `workers` must not exceed `size` (a `workers > size` queue would report
//!   fullness before the worker limit is ever reachable).

use crate::error::ConfigError;

/// Construction options for a [`TaskQueue`](crate::TaskQueue).
///
/// ## Field semantics
/// - `name`: logged with every record; purely informational.
/// - `size`: maximum number of tasks simultaneously in the system
///   (running + accepted-but-not-yet-running + blocked callers).
/// - `workers`: maximum number of tasks concurrently *executing*.
///
/// ## Example
/// ```rust
/// use taskgate::QueueConfig;
///
/// let cfg = QueueConfig {
///     name: "uploads".into(),
///     size: Some(8),
///     workers: Some(2),
/// };
/// assert_eq!(cfg.limits().unwrap(), (8, 2));
///
/// // A single limit propagates to the other.
/// let cfg = QueueConfig { size: Some(4), ..Default::default() };
/// assert_eq!(cfg.limits().unwrap(), (4, 4));
/// ```
#[derive(Clone, Debug, Default)]
pub struct QueueConfig {
    /// Name of the queue, included in log records.
    pub name: String,

    /// Maximum number of simultaneously admitted tasks.
    ///
    /// Defaults to `workers` when absent, or 1 when both are absent.
    pub size: Option<usize>,

    /// Maximum number of concurrently executing tasks.
    ///
    /// Defaults to `size` when absent, or 1 when both are absent.
    pub workers: Option<usize>,
}

impl QueueConfig {
    /// Resolves the configured limits to concrete `(size, workers)` values.
    ///
    /// Applies the defaulting rules and validates the result.
    pub fn limits(&self) -> Result<(usize, usize), ConfigError> {
        let (size, workers) = match (self.size, self.workers) {
            (None, None) => (1, 1),
            (Some(s), None) => (s, s),
            (None, Some(w)) => (w, w),
            (Some(s), Some(w)) => (s, w),
        };

        if size < 1 {
            return Err(ConfigError::SizeTooSmall(size));
        }
        if workers < 1 {
            return Err(ConfigError::WorkersTooSmall(workers));
        }
        if workers > size {
            return Err(ConfigError::WorkersExceedSize { size, workers });
        }

        Ok((size, workers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_one_when_unset() {
        let cfg = QueueConfig::default();
        assert_eq!(cfg.limits().unwrap(), (1, 1));
    }

    #[test]
    fn test_single_limit_copies_to_other() {
        let cfg = QueueConfig {
            size: Some(5),
            ..Default::default()
        };
        assert_eq!(cfg.limits().unwrap(), (5, 5));

        let cfg = QueueConfig {
            workers: Some(3),
            ..Default::default()
        };
        assert_eq!(cfg.limits().unwrap(), (3, 3));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let cfg = QueueConfig {
            size: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.limits(), Err(ConfigError::SizeTooSmall(0)));

        let cfg = QueueConfig {
            size: Some(2),
            workers: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.limits(), Err(ConfigError::WorkersTooSmall(0)));
    }

    #[test]
    fn test_workers_must_not_exceed_size() {
        let cfg = QueueConfig {
            size: Some(2),
            workers: Some(4),
            ..Default::default()
        };
        assert_eq!(
            cfg.limits(),
            Err(ConfigError::WorkersExceedSize {
                size: 2,
                workers: 4
            })
        );
    }
}
