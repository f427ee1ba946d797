//! Utility functions and helpers for the textbook backend.
//!
//! # Submodules
//!
//! - `logging`: Tracing initialization and secret redaction for log lines.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod logging;
