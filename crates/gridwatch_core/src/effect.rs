use std::time::Duration;

/// Side effects requested by [`crate::update`]; executed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    OpenConnection,
    CloseConnection,
    ScheduleRetry { attempt: u32, delay: Duration },
    CancelRetry,
    PublishStatus(bool),
}
