//! Wall-clock budget for one extraction.

use std::time::Duration;
use std::time::Instant;

use crate::GuardError;
use crate::Result;

/// Point in time after which extraction gives up.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    until: Instant,
}

impl Deadline {
    /// Starts a deadline that expires `budget` from now.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            until: started + budget,
        }
    }

    /// Returns `true` once the budget is spent.
    #[must_use]
    pub fn expired(&self) -> bool {
        Instant::now() > self.until
    }

    /// Fails with `GuardError::Timeout` once the budget is spent.
    pub fn check(&self) -> Result<()> {
        if self.expired() {
            return Err(GuardError::Timeout {
                elapsed_ms: self.started.elapsed().as_millis(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_not_expired() {
        let deadline = Deadline::after(Duration::from_secs(60));
        assert!(!deadline.expired());
        assert!(deadline.check().is_ok());
    }

    #[test]
    fn test_deadline_expired() {
        let deadline = Deadline::after(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(2));
        assert!(deadline.expired());
        assert!(matches!(deadline.check(), Err(GuardError::Timeout { .. })));
    }
}
