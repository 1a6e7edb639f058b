//! Secret declarations as supplied by host configuration.
//!
//! These types are read-only inputs to the generation engine. Storage paths
//! are kept exactly as declared; the engine normalises them against the
//! repository root.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::identifiers::{HostName, SecretName};

/// A host and the secrets it declares, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDecl {
    /// Host name
    pub name: HostName,
    /// Declared secrets
    pub secrets: Vec<SecretDecl>,
}

impl HostDecl {
    /// Create a host with no secrets.
    pub fn new(name: HostName) -> Self {
        Self {
            name,
            secrets: Vec::new(),
        }
    }

    /// Add a secret declaration.
    pub fn with_secret(mut self, secret: SecretDecl) -> Self {
        self.secrets.push(secret);
        self
    }
}

/// A secret declared by a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretDecl {
    /// Name of the secret on its host
    pub name: SecretName,
    /// Storage path of the encrypted artifact, as declared
    pub file: PathBuf,
    /// How to generate the secret, if it is generated at all
    pub generator: Option<GeneratorDecl>,
}

/// Generator record of a secret declaration.
///
/// Exactly one of `script` and `preset` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorDecl {
    /// Script template producing the plaintext on stdout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    /// Name of a built-in generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Secrets this generator reads
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

impl GeneratorDecl {
    /// Generator running a script template.
    pub fn script(script: impl Into<String>) -> Self {
        Self {
            script: Some(script.into()),
            ..Default::default()
        }
    }

    /// Generator using a built-in preset.
    pub fn preset(preset: impl Into<String>) -> Self {
        Self {
            preset: Some(preset.into()),
            ..Default::default()
        }
    }

    /// Add a dependency.
    pub fn depends_on(mut self, secret: SecretName, file: impl Into<PathBuf>) -> Self {
        self.dependencies.push(DependencyRef {
            secret,
            file: file.into(),
        });
        self
    }
}

/// Reference from a generator to another secret, not yet resolved to a host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencyRef {
    /// Name of the referenced secret
    pub secret: SecretName,
    /// Storage path of the referenced secret, as declared
    pub file: PathBuf,
}
