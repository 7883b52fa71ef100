//! Process-wide plumbing shared by every subcommand: the debug log file and crash log.

mod logging;

#[cfg(test)]
pub(crate) use logging::set_logging_for_tests;
pub use logging::{crash_log_path, init_logging, install_panic_hook, log_debug, log_file_path, log_panic};
