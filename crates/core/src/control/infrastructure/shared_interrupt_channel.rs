use std::sync::{Arc, Mutex};

use crate::control::domain::interrupt_channel::InterruptChannel;
use crate::control::domain::interrupt_signal::InterruptSignal;

/// In-process interrupt channel. Signals are set through an
/// [`InterruptHandle`] from any thread.
pub struct SharedInterruptChannel {
    state: Arc<Mutex<InterruptSignal>>,
}

/// Observer side of a [`SharedInterruptChannel`].
#[derive(Clone)]
pub struct InterruptHandle {
    state: Arc<Mutex<InterruptSignal>>,
}

impl SharedInterruptChannel {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InterruptSignal::None)),
        }
    }

    pub fn handle(&self) -> InterruptHandle {
        InterruptHandle {
            state: self.state.clone(),
        }
    }
}

impl Default for SharedInterruptChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptHandle {
    pub fn send(&self, signal: InterruptSignal) {
        match self.state.lock() {
            Ok(mut state) => *state = signal,
            Err(poisoned) => *poisoned.into_inner() = signal,
        }
    }

    pub fn current(&self) -> InterruptSignal {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl InterruptChannel for SharedInterruptChannel {
    fn read(&self) -> Result<InterruptSignal, Box<dyn std::error::Error>> {
        let state = self
            .state
            .lock()
            .map_err(|_| "interrupt state lock poisoned")?;
        Ok(*state)
    }

    fn mark_ended(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| "interrupt state lock poisoned")?;
        *state = InterruptSignal::Ended;
        Ok(())
    }
}
