//! Common utility functions.

pub mod data;
pub mod process;
pub mod fs;

// Re-export commonly used items
pub use data::deep_merge;
pub use process::{run_async_with_input, ShellRunner};
pub use fs::{expand_path, modified_nanos, normalize_path};
