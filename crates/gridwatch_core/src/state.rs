use std::time::Duration;

use crate::view_model::LinkView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Fixed-delay retry budget for one logical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    attempts_so_far: u32,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
            attempts_so_far: 0,
        }
    }

    pub fn attempts_so_far(&self) -> u32 {
        self.attempts_so_far
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts_so_far >= self.max_attempts
    }

    pub(crate) fn reset(&mut self) {
        self.attempts_so_far = 0;
    }

    /// Claims the next retry slot, returning its 1-based number.
    pub(crate) fn next_attempt(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts_so_far += 1;
        Some(self.attempts_so_far)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(5000))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkState {
    connection: ConnectionState,
    policy: ReconnectPolicy,
    retry_pending: bool,
    exhausted: bool,
    dirty: bool,
}

impl LinkState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn retry_pending(&self) -> bool {
        self.retry_pending
    }

    /// True once a failure found the retry budget spent; cleared by `Msg::Start`.
    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn view(&self) -> LinkView {
        LinkView {
            state: self.connection,
            attempts_so_far: self.policy.attempts_so_far(),
            max_attempts: self.policy.max_attempts,
            retry_pending: self.retry_pending,
            exhausted: self.exhausted,
        }
    }

    /// Returns whether anything observable changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn policy_mut(&mut self) -> &mut ReconnectPolicy {
        self.dirty = true;
        &mut self.policy
    }

    pub(crate) fn set_connection(&mut self, connection: ConnectionState) {
        if self.connection != connection {
            self.connection = connection;
            self.dirty = true;
        }
    }

    pub(crate) fn set_exhausted(&mut self, exhausted: bool) {
        if self.exhausted != exhausted {
            self.exhausted = exhausted;
            self.dirty = true;
        }
    }

    pub(crate) fn set_retry_pending(&mut self, pending: bool) {
        if self.retry_pending != pending {
            self.retry_pending = pending;
            self.dirty = true;
        }
    }
}
