//! Core trait definitions for keysmith's collaborators.

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use crate::errors::Result;
use crate::identifiers::{HostName, SecretName};
use crate::declarations::SecretDecl;

/// Trait for encryption backends.
///
/// Implementers seal plaintexts into the artifacts stored in the repository.
/// Opening them again is left to generator scripts, which run the command
/// returned by [`Sealer::decrypt_command`] on a dependency's path.
#[async_trait]
pub trait Sealer: Send + Sync {
    /// Encrypt a plaintext, returning the ciphertext bytes.
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Command line that decrypts a path appended as its last argument.
    ///
    /// Generator templates embed this so scripts can read their dependencies.
    fn decrypt_command(&self) -> Vec<String>;
}

/// Trait for version-control staging.
#[async_trait]
pub trait IndexStager: Send + Sync {
    /// Stage `path` into the index.
    async fn stage(&self, path: &Path) -> Result<()>;
}

/// Captured result of running a generator script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Standard output (the plaintext on success)
    pub stdout: Vec<u8>,
    /// Standard error
    pub stderr: String,
    /// Exit code, if the process exited normally
    pub code: Option<i32>,
}

impl ScriptOutput {
    /// Whether the script exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Human readable exit status.
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Trait for executing generator scripts.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    /// Run `script` to completion and capture its output.
    async fn run(&self, script: &str) -> Result<ScriptOutput>;
}

/// A dependency resolved to the host that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// Host declaring the dependency
    pub host: HostName,
    /// Name of the secret on that host
    pub name: SecretName,
    /// Normalised storage path
    pub file: std::path::PathBuf,
}

/// Everything a script factory may use to render a generator script.
#[derive(Debug, Clone, Copy)]
pub struct ScriptContext<'a> {
    /// The secret being generated
    pub secret: &'a SecretDecl,
    /// Its normalised storage path
    pub file: &'a Path,
    /// Its dependencies, in declaration order
    pub dependencies: &'a [ResolvedDependency],
    /// Decrypt command exposed to the script
    pub decrypt: &'a [String],
}

/// Trait for generator script factories.
///
/// Each kind of generator (template, preset) implements this trait. The
/// rendered script must be a pure function of the context: two declarations
/// of the same storage path are only compatible if they render identically.
pub trait ScriptFactory: Send + Sync + fmt::Debug {
    /// Render the shell script for the given context.
    fn script(&self, ctx: &ScriptContext<'_>) -> Result<String>;

    /// Short description used in diagnostics.
    fn describe(&self) -> String;
}
