/// Follow-up work the caller must perform after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// State changed and must be written to durable storage.
    Persist,
    /// The background poller should be stopped.
    StopPoller,
}
