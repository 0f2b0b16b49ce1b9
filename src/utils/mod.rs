//! Shared utilities

mod logger;
mod signal;
mod timer;

pub use logger::{init_logger, LogLevel};
pub use signal::watch_interrupts;
pub use timer::Timer;
