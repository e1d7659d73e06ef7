/// Publishes a run's percentage complete to an outside observer.
pub trait ProgressReporter: Send {
    /// Overwrites the previously reported value.
    fn report(&mut self, percent: u8) -> Result<(), Box<dyn std::error::Error>>;
}
