pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod ranking;

pub mod testing;

// Re-export key types from modules for easier testing access
pub use error::{MonitorError, SampleError, SelectorError};
pub use process::*;
pub use ranking::*;
