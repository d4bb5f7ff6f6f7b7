//! Console state and the file loggers that sit beside it.

mod logging;
mod state;

#[cfg(test)]
pub(crate) use logging::set_logging_for_tests;
pub use logging::{
    crash_log_path, init_logging, log_debug, log_debug_content, log_file_path, log_panic,
    log_timing,
};
pub use state::App;
