use std::sync::{Arc, Mutex};

use crate::control::domain::progress_reporter::ProgressReporter;

/// Keeps every reported value in memory. Clones share the same record, so a
/// caller can hand one to the pipeline and inspect the other.
#[derive(Clone, Default)]
pub struct MemoryProgressReporter {
    values: Arc<Mutex<Vec<u8>>>,
}

impl MemoryProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> Vec<u8> {
        match self.values.lock() {
            Ok(values) => values.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<u8> {
        self.values().last().copied()
    }
}

impl ProgressReporter for MemoryProgressReporter {
    fn report(&mut self, percent: u8) -> Result<(), Box<dyn std::error::Error>> {
        self.values
            .lock()
            .map_err(|_| "progress record lock poisoned")?
            .push(percent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        let mut reporter = MemoryProgressReporter::new();
        let observer = reporter.clone();
        reporter.report(0).unwrap();
        reporter.report(50).unwrap();
        assert_eq!(observer.values(), vec![0, 50]);
        assert_eq!(observer.last(), Some(50));
    }

    #[test]
    fn test_empty() {
        assert_eq!(MemoryProgressReporter::new().last(), None);
    }
}
