use std::time::Duration;

use crate::domain::OverdraftPolicy;

/// Runtime knobs for the transfer service and its store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Longest a transfer waits for its account locks before giving up.
    pub lock_timeout: Duration,
    /// Longest a SQLite writer waits on another connection's lock.
    pub busy_timeout: Duration,
    pub overdraft: OverdraftPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            overdraft: OverdraftPolicy::Allow,
        }
    }
}

impl ServiceConfig {
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn with_overdraft(mut self, policy: OverdraftPolicy) -> Self {
        self.overdraft = policy;
        self
    }
}
