//! # Keysmith Types
//!
//! Core types, traits, and errors shared across all keysmith crates.
//!
//! This crate provides the fundamental building blocks for the keysmith
//! secret generator, including:
//!
//! - Validated identifiers for hosts and secrets
//! - The declaration model read from host configuration files
//! - Traits for the external collaborators (sealer, git stager, script runner)
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```
//! use keysmith_types::{HostName, SecretName};
//!
//! let host = HostName::new("web-1").unwrap();
//! assert_eq!(host.as_str(), "web-1");
//!
//! let secret = SecretName::new("db-password").unwrap();
//! assert_eq!(secret.to_string(), "db-password");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identifiers;
pub mod enums;
pub mod declarations;
pub mod traits;
pub mod config;

// Re-export common types for convenience
pub use errors::{KeysmithError, Result};
pub use identifiers::{HostName, SecretName, Definition};
pub use enums::{LogLevel, StaleReason};
pub use declarations::{DependencyRef, GeneratorDecl, HostDecl, SecretDecl};
pub use traits::{
    IndexStager, ResolvedDependency, ScriptContext, ScriptFactory, ScriptOutput, ScriptRunner,
    Sealer,
};
