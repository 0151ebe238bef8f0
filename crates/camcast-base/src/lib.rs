pub mod logging;
pub mod resolution;

pub use logging::{FileLogger, StdoutLogger, init_file_logger, init_stdout_logger};
pub use resolution::{RESOLUTION_MODES, Resolution};

// Re-export log crate so downstream crates can use camcast_base::log::*
pub use log;
