#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Stop reading the snapshot file; no further poll ticks.
    StopPolling,
    /// Completion was triggered; the host should arm its auto-close delay.
    AnnounceCompletion,
    /// Leave the event loop and tear the terminal down.
    Quit,
}
