//! The set of hosts in a keysmith repository.

use keysmith_core::util::fs::normalize_path;
use keysmith_types::{HostDecl, KeysmithError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::host::load_host;

/// All hosts of a repository, in enumeration order.
///
/// The inventory is read once per run and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Inventory {
    root: PathBuf,
    hosts: Vec<HostDecl>,
}

impl Inventory {
    /// Load every host file found directly under `root/hosts_dir`.
    ///
    /// Files ending in `.yml` or `.yaml` are hosts; anything else is
    /// ignored. Hosts are ordered by file name.
    pub fn load(root: impl AsRef<Path>, hosts_dir: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let dir = normalize_path(root, hosts_dir);

        if !dir.is_dir() {
            return Err(KeysmithError::Inventory(format!(
                "Host directory not found: {}",
                dir.display()
            )));
        }

        let mut builder = InventoryBuilder::new(root);
        let mut seen = HashSet::new();

        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| KeysmithError::Inventory(format!(
                "Failed to list {}: {}",
                dir.display(),
                e
            )))?;

            let path = entry.path();
            let is_host_file = entry.file_type().is_file()
                && matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yml") | Some("yaml")
                );
            if !is_host_file {
                tracing::trace!(path = %path.display(), "skipping non-host file");
                continue;
            }

            let host = load_host(path)?;
            if !seen.insert(host.name.clone()) {
                return Err(KeysmithError::Inventory(format!(
                    "Host {} is defined more than once in {}",
                    host.name,
                    dir.display()
                )));
            }

            tracing::debug!(host = %host.name, secrets = host.secrets.len(), "loaded host");
            builder = builder.host(host);
        }

        Ok(builder.build())
    }

    /// Repository root all storage paths are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Hosts in enumeration order.
    pub fn hosts(&self) -> &[HostDecl] {
        &self.hosts
    }

    /// Number of hosts.
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Whether the repository has no hosts.
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// Builder for assembling an inventory in code.
#[derive(Debug, Default)]
pub struct InventoryBuilder {
    root: PathBuf,
    hosts: Vec<HostDecl>,
}

impl InventoryBuilder {
    /// Start an inventory rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            hosts: Vec::new(),
        }
    }

    /// Append a host.
    pub fn host(mut self, host: HostDecl) -> Self {
        self.hosts.push(host);
        self
    }

    /// Finish the inventory.
    pub fn build(self) -> Inventory {
        Inventory {
            root: self.root,
            hosts: self.hosts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_host(dir: &Path, file: &str, body: &str) {
        fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn test_load_orders_hosts_by_file_name() {
        let temp_dir = TempDir::new().unwrap();
        let hosts = temp_dir.path().join("hosts");
        fs::create_dir(&hosts).unwrap();

        write_host(&hosts, "web.yml", "secrets:\n  a:\n    file: a.age\n");
        write_host(&hosts, "db.yaml", "secrets:\n  b:\n    file: b.age\n");
        write_host(&hosts, "README.md", "not a host");

        let inventory = Inventory::load(temp_dir.path(), "hosts").unwrap();
        let names: Vec<&str> = inventory.hosts().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["db", "web"]);
        assert_eq!(inventory.root(), temp_dir.path());
    }

    #[test]
    fn test_load_rejects_duplicate_hosts() {
        let temp_dir = TempDir::new().unwrap();
        let hosts = temp_dir.path().join("hosts");
        fs::create_dir(&hosts).unwrap();

        write_host(&hosts, "web.yml", "");
        write_host(&hosts, "web.yaml", "");

        let err = Inventory::load(temp_dir.path(), "hosts").unwrap_err();
        assert!(matches!(err, KeysmithError::Inventory(m) if m.contains("more than once")));
    }

    #[test]
    fn test_load_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Inventory::load(temp_dir.path(), "hosts").is_err());
    }

    #[test]
    fn test_empty_directory_has_no_hosts() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("machines")).unwrap();

        let inventory = Inventory::load(temp_dir.path(), "machines").unwrap();
        assert!(inventory.is_empty());
        assert_eq!(inventory.len(), 0);
    }
}
