use crate::ConnectionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkView {
    pub state: ConnectionState,
    pub attempts_so_far: u32,
    pub max_attempts: u32,
    pub retry_pending: bool,
    /// The retry budget ran out; only an external start reconnects.
    pub exhausted: bool,
}

impl LinkView {
    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Incremental progress of one batch load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchProgress {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    /// Completed share in `0.0..=1.0`; an empty batch counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}
