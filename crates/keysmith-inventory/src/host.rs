//! Host file parsing.

use indexmap::IndexMap;
use keysmith_types::{GeneratorDecl, HostDecl, HostName, KeysmithError, Result, SecretDecl, SecretName};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HostFile {
    #[serde(default)]
    secrets: IndexMap<SecretName, SecretEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SecretEntry {
    file: PathBuf,
    #[serde(default)]
    generator: Option<GeneratorDecl>,
}

/// Parse the YAML body of a host file.
pub fn parse_host(name: HostName, content: &str) -> Result<HostDecl> {
    // An empty file declares nothing
    if content.trim().is_empty() {
        return Ok(HostDecl::new(name));
    }

    let parsed: HostFile = serde_yaml::from_str(content)
        .map_err(|e| KeysmithError::Inventory(format!("Failed to parse host {}: {}", name, e)))?;

    let secrets = parsed
        .secrets
        .into_iter()
        .map(|(secret, entry)| SecretDecl {
            name: secret,
            file: entry.file,
            generator: entry.generator,
        })
        .collect();

    Ok(HostDecl { name, secrets })
}

/// Load a host file; the host name is the file stem.
pub fn load_host(path: impl AsRef<Path>) -> Result<HostDecl> {
    let path = path.as_ref();
    let name = HostName::from_path(path)?;

    let content = std::fs::read_to_string(path).map_err(|e| {
        KeysmithError::Inventory(format!("Failed to read {}: {}", path.display(), e))
    })?;

    parse_host(name, &content)
}
