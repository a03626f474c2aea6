//! Logger initialisation for binaries and examples.
//!
//! Library code only talks to the `log` facade; this module installs
//! `env_logger` behind it.

mod init;

pub use init::{init_logging, resolve_filter, LoggingConfig, DEFAULT_FILTER};
