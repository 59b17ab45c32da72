//! Logging abstractions
//!
//! Components log through an injected `Logger`; verbose request tracing goes
//! to the global file log via the `*_log!` macros.

mod traits;
mod noop;
mod console;
pub mod file_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;

pub use file_logger::{log_file_path, LogLevel};
