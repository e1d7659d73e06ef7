use super::interrupt_signal::InterruptSignal;

/// Polled side channel through which an observer steers a running job.
///
/// Reads return whatever signal is current; signals are not queued, so one
/// overwritten before the next poll is never seen.
pub trait InterruptChannel: Send {
    fn read(&self) -> Result<InterruptSignal, Box<dyn std::error::Error>>;

    /// Records that the run is over. Written once, after cleanup.
    fn mark_ended(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
