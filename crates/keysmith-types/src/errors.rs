//! Error types for keysmith operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for keysmith operations.
///
/// Every variant is fatal for a run. Ambiguous dependency owners are only
/// warnings and are reported through the plan instead.
#[derive(Error, Debug)]
pub enum KeysmithError {
    /// Repository configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host inventory could not be loaded
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Two declarations of the same storage path render different scripts
    #[error(
        "Conflicting generators for {}: declared by {} with differing scripts",
        .file.display(),
        .definitions.join(", ")
    )]
    Conflict {
        /// Storage path shared by the declarations
        file: PathBuf,
        /// Every `host:secret` pair declaring the path
        definitions: Vec<String>,
    },

    /// A dependency references a secret no host declares with a generator
    #[error(
        "Secret {dependent} depends on {secret} ({}), which no host declares with a generator",
        .file.display()
    )]
    UnresolvableDependency {
        /// `host:secret` of the dependent declaration
        dependent: String,
        /// Name of the referenced secret
        secret: String,
        /// Storage path of the referenced secret
        file: PathBuf,
    },

    /// The dependency graph contains a cycle
    #[error("Circular dependency detected: {}", render_cycle(.cycle))]
    CyclicDependency {
        /// Storage paths along the cycle, first node repeated at the end
        cycle: Vec<PathBuf>,
    },

    /// A generator exited unsuccessfully
    #[error("Generator for {} failed ({status}): {stderr}", .file.display())]
    GeneratorFailure {
        /// Storage path of the secret being generated
        file: PathBuf,
        /// Exit status description
        status: String,
        /// Captured standard error
        stderr: String,
    },

    /// Encrypting a plaintext failed
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Writing an encrypted artifact failed
    #[error("Failed to write {}: {source}", .file.display())]
    Persist {
        /// Storage path being written
        file: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Staging a path into the git index failed
    #[error("Git staging error: {0}")]
    VcsStage(String),

    /// A requested target is not a managed secret
    #[error("{} is not the path of any generated secret", .0.display())]
    UnknownTarget(PathBuf),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal bug - should never happen in production
    #[error("Bug detected: {0}\n\nThis is an internal error. Please report it to the keysmith maintainers.")]
    Bug(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn render_cycle(cycle: &[PathBuf]) -> String {
    cycle
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl KeysmithError {
    /// Build a persist error for `file`.
    pub fn persist(file: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Persist {
            file: file.as_ref().to_path_buf(),
            source,
        }
    }
}

/// A specialized Result type for keysmith operations.
pub type Result<T> = std::result::Result<T, KeysmithError>;

/// Helper macro to create and return a KeysmithError::Bug
///
/// This should be used for conditions that should never occur
/// in normal operation and indicate a bug in keysmith itself.
///
/// # Example
///
/// ```ignore
/// if some_impossible_condition {
///     bug!("This should never happen: {:?}", condition);
/// }
/// ```
#[macro_export]
macro_rules! bug {
    ($msg:expr) => {
        return Err($crate::KeysmithError::Bug($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::KeysmithError::Bug(format!($fmt, $($arg)*)))
    };
}

/// Helper macro to bail out with a KeysmithError
///
/// This is used for expected error conditions.
///
/// # Example
///
/// ```ignore
/// if !valid {
///     bail!(Validation, "Invalid template: {}", reason);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::KeysmithError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::KeysmithError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::KeysmithError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::KeysmithError::Other(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_rendering() {
        let err = KeysmithError::CyclicDependency {
            cycle: vec![
                PathBuf::from("/r/a.age"),
                PathBuf::from("/r/b.age"),
                PathBuf::from("/r/a.age"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency detected: /r/a.age -> /r/b.age -> /r/a.age"
        );
    }

    #[test]
    fn test_conflict_names_all_definitions() {
        let err = KeysmithError::Conflict {
            file: PathBuf::from("/r/shared.age"),
            definitions: vec!["web:pw".to_string(), "db:pw".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("/r/shared.age"));
        assert!(msg.contains("web:pw, db:pw"));
    }

    fn bails(variant: bool) -> Result<()> {
        if variant {
            bail!(Validation, "bad {}", "thing");
        }
        bail!("plain");
    }

    #[test]
    fn test_bail_macro() {
        assert!(matches!(bails(true), Err(KeysmithError::Validation(m)) if m == "bad thing"));
        assert!(matches!(bails(false), Err(KeysmithError::Other(m)) if m == "plain"));
    }
}
