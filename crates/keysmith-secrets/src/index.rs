//! Deduplication of secret declarations by storage path.

use indexmap::IndexMap;
use keysmith_core::util::fs::normalize_path;
use keysmith_types::{
    Definition, HostName, KeysmithError, ResolvedDependency, Result, ScriptContext, SecretDecl,
    SecretName,
};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::collector::Collected;
use crate::generator::create_factory;
use crate::resolver::OwnerIndex;

/// A secret ready to be scheduled: one storage path, one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// Normalised storage path
    pub file: PathBuf,
    /// Rendered generator script
    pub script: String,
    /// Short description of the generator kind
    pub generator: String,
    /// Every `host:secret` declaring this path, in merge order
    pub definitions: Vec<Definition>,
    /// The first declaration merged for this path
    pub secret: SecretDecl,
    /// Resolved dependencies, in declaration order
    pub dependencies: Vec<ResolvedDependency>,
}

impl ResolvedEntry {
    /// Storage paths of the dependencies.
    pub fn dependency_files(&self) -> impl Iterator<Item = &Path> {
        self.dependencies.iter().map(|d| d.file.as_path())
    }

    /// Definitions joined for display, e.g. `web:tls-key, db:tls-key`.
    pub fn describe_definitions(&self) -> String {
        self.definitions
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Non-fatal diagnostics found while building a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanWarning {
    /// Several hosts declare the same dependency; the first one was used.
    AmbiguousOwner {
        /// Name of the dependency
        secret: SecretName,
        /// Its storage path
        file: PathBuf,
        /// Declaring hosts, in enumeration order
        hosts: Vec<HostName>,
    },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::AmbiguousOwner { secret, file, hosts } => {
                let hosts: Vec<&str> = hosts.iter().map(|h| h.as_str()).collect();
                write!(
                    f,
                    "dependency {} ({}) is declared by several hosts ({}); using {}",
                    secret,
                    file.display(),
                    hosts.join(", "),
                    hosts.first().copied().unwrap_or_default()
                )
            }
        }
    }
}

/// Resolved entries keyed by storage path, in first-declaration order.
#[derive(Debug)]
pub struct SecretIndex {
    root: PathBuf,
    decrypt: Vec<String>,
    entries: IndexMap<PathBuf, ResolvedEntry>,
    warnings: Vec<PlanWarning>,
    warned: HashSet<PathBuf>,
}

impl SecretIndex {
    /// Create an empty index for the repository at `root`.
    ///
    /// `decrypt` is the command line generator scripts see as `{{decrypt}}`.
    pub fn new(root: impl AsRef<Path>, decrypt: Vec<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            decrypt,
            entries: IndexMap::new(),
            warnings: Vec::new(),
            warned: HashSet::new(),
        }
    }

    /// Merge one collected declaration.
    ///
    /// The script is rendered with dependencies resolved through `owners`. A
    /// new path is inserted; a known path must render the identical script,
    /// in which case the declaration is appended to the entry's definitions.
    pub fn merge(&mut self, item: &Collected<'_>, owners: &OwnerIndex) -> Result<()> {
        let definition = item.definition();
        let file = normalize_path(&self.root, &item.secret.file);

        let mut dependencies = Vec::with_capacity(item.generator.dependencies.len());
        for dep in &item.generator.dependencies {
            let resolution = owners.resolve(&definition, dep)?;
            if let Some(hosts) = resolution.ambiguous {
                self.warn_ambiguous(&resolution.dependency, hosts);
            }
            dependencies.push(resolution.dependency);
        }

        let factory = create_factory(item.generator).map_err(|e| match e {
            KeysmithError::Validation(msg) => {
                KeysmithError::Validation(format!("{}: {}", definition, msg))
            }
            other => other,
        })?;
        let script = factory.script(&ScriptContext {
            secret: item.secret,
            file: &file,
            dependencies: &dependencies,
            decrypt: &self.decrypt,
        })?;

        match self.entries.get_mut(&file) {
            Some(existing) if existing.script != script => {
                let mut definitions: Vec<String> =
                    existing.definitions.iter().map(|d| d.to_string()).collect();
                definitions.push(definition.to_string());
                Err(KeysmithError::Conflict { file, definitions })
            }
            Some(existing) => {
                tracing::debug!(file = %file.display(), %definition, "deduplicated declaration");
                existing.definitions.push(definition);
                Ok(())
            }
            None => {
                tracing::trace!(file = %file.display(), %definition, generator = %factory.describe(), "indexed secret");
                self.entries.insert(
                    file.clone(),
                    ResolvedEntry {
                        file,
                        script,
                        generator: factory.describe(),
                        definitions: vec![definition],
                        secret: item.secret.clone(),
                        dependencies,
                    },
                );
                Ok(())
            }
        }
    }

    fn warn_ambiguous(&mut self, dep: &ResolvedDependency, hosts: Vec<HostName>) {
        if !self.warned.insert(dep.file.clone()) {
            return;
        }
        let warning = PlanWarning::AmbiguousOwner {
            secret: dep.name.clone(),
            file: dep.file.clone(),
            hosts,
        };
        // Callers print recorded warnings themselves.
        tracing::info!("{}", warning);
        self.warnings.push(warning);
    }

    /// Look up the entry for a normalised storage path.
    pub fn get(&self, file: &Path) -> Option<&ResolvedEntry> {
        self.entries.get(file)
    }

    /// Entries keyed by storage path, in insertion order.
    pub fn entries(&self) -> &IndexMap<PathBuf, ResolvedEntry> {
        &self.entries
    }

    /// Warnings recorded while merging.
    pub fn warnings(&self) -> &[PlanWarning] {
        &self.warnings
    }

    /// Number of distinct storage paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been merged.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the entries and warnings out of the index.
    pub fn into_parts(self) -> (IndexMap<PathBuf, ResolvedEntry>, Vec<PlanWarning>) {
        (self.entries, self.warnings)
    }
}
