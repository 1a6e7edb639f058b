//! # Keysmith Core
//!
//! Core utilities, configuration management, logging, and common functionality
//! for the keysmith secret generator.
//!
//! This crate provides:
//!
//! - **Configuration**: Layered repository configuration (file, environment)
//! - **Logging**: Structured logging to the console and optional log files
//! - **Terminal**: Terminal detection
//! - **Process Execution**: Generator and sealer subprocesses
//! - **File Operations**: Path normalisation, timestamps
//! - **Time Utilities**: Duration and timestamp formatting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod log;
pub mod term;
pub mod util;
pub mod time;

// Re-export commonly used items
pub use config::{Config, RepoConfig, MARKER_FILE};
pub use keysmith_types::{KeysmithError, Result};

