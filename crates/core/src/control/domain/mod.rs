pub mod interrupt_channel;
pub mod interrupt_signal;
pub mod progress_reporter;
