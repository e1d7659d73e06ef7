pub mod file_interrupt_channel;
pub mod file_progress_reporter;
pub mod memory_progress_reporter;
pub mod shared_interrupt_channel;
