#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    /// External start or restart request.
    Start,
    /// The pending connection attempt succeeded.
    Opened,
    /// The connection attempt failed, or an open connection closed or errored.
    Closed,
    /// The scheduled retry delay has elapsed.
    RetryElapsed,
    /// External stop/teardown request.
    Stop,
}
