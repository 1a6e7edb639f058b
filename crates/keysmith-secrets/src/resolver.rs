//! Resolves dependency references to the hosts that own them.

use keysmith_core::util::fs::normalize_path;
use keysmith_types::{
    DependencyRef, Definition, HostName, KeysmithError, ResolvedDependency, Result, SecretName,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::collector::Collected;

/// Result of resolving one dependency reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The dependency, attributed to its owner
    pub dependency: ResolvedDependency,
    /// Every host declaring it, in enumeration order, when there is more than one
    pub ambiguous: Option<Vec<HostName>>,
}

/// Index from `(secret name, storage path)` to the hosts declaring it.
///
/// Built in a single pass over the collected declarations and read-only
/// afterwards. Only secrets with a generator are indexed: a generator may
/// not depend on a secret nobody generates.
#[derive(Debug)]
pub struct OwnerIndex {
    root: PathBuf,
    owners: HashMap<(SecretName, PathBuf), Vec<HostName>>,
}

impl OwnerIndex {
    /// Build the index.
    pub fn build(root: impl AsRef<Path>, collected: &[Collected<'_>]) -> Self {
        let root = root.as_ref().to_path_buf();
        let mut owners: HashMap<(SecretName, PathBuf), Vec<HostName>> = HashMap::new();

        for item in collected {
            let file = normalize_path(&root, &item.secret.file);
            owners
                .entry((item.secret.name.clone(), file))
                .or_default()
                .push(item.host.clone());
        }

        Self { root, owners }
    }

    /// Find the host owning `dep`, which `dependent` references.
    ///
    /// # Errors
    ///
    /// `UnresolvableDependency` when no host declares a generated secret with
    /// that name and storage path.
    pub fn resolve(&self, dependent: &Definition, dep: &DependencyRef) -> Result<Resolution> {
        let file = normalize_path(&self.root, &dep.file);

        let hosts = self
            .owners
            .get(&(dep.secret.clone(), file.clone()))
            .filter(|hosts| !hosts.is_empty())
            .ok_or_else(|| KeysmithError::UnresolvableDependency {
                dependent: dependent.to_string(),
                secret: dep.secret.to_string(),
                file: file.clone(),
            })?;

        let ambiguous = (hosts.len() > 1).then(|| hosts.clone());

        Ok(Resolution {
            dependency: ResolvedDependency {
                host: hosts[0].clone(),
                name: dep.secret.clone(),
                file,
            },
            ambiguous,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::collect;
    use keysmith_types::{GeneratorDecl, HostDecl, SecretDecl};

    fn generated(name: &str, file: &str) -> SecretDecl {
        SecretDecl {
            name: SecretName::new(name).unwrap(),
            file: PathBuf::from(file),
            generator: Some(GeneratorDecl::script("true")),
        }
    }

    fn host(name: &str) -> HostDecl {
        HostDecl::new(HostName::new(name).unwrap())
    }

    fn reference(name: &str, file: &str) -> DependencyRef {
        DependencyRef {
            secret: SecretName::new(name).unwrap(),
            file: PathBuf::from(file),
        }
    }

    fn dependent() -> Definition {
        Definition {
            host: HostName::new("app").unwrap(),
            secret: SecretName::new("child").unwrap(),
        }
    }

    #[test]
    fn test_single_owner() {
        let hosts = vec![host("web").with_secret(generated("root", "secrets/root.age"))];
        let collected = collect(&hosts);
        let index = OwnerIndex::build("/repo", &collected);

        let resolved = index
            .resolve(&dependent(), &reference("root", "./secrets/root.age"))
            .unwrap();
        assert_eq!(resolved.dependency.host.as_str(), "web");
        assert_eq!(resolved.dependency.file, PathBuf::from("/repo/secrets/root.age"));
        assert!(resolved.ambiguous.is_none());
    }

    #[test]
    fn test_ambiguous_owner_picks_first_host() {
        let hosts = vec![
            host("b").with_secret(generated("root", "root.age")),
            host("a").with_secret(generated("root", "root.age")),
        ];
        let collected = collect(&hosts);
        let index = OwnerIndex::build("/repo", &collected);

        let resolved = index.resolve(&dependent(), &reference("root", "root.age")).unwrap();
        assert_eq!(resolved.dependency.host.as_str(), "b");
        let hosts: Vec<String> = resolved.ambiguous.unwrap().iter().map(|h| h.to_string()).collect();
        assert_eq!(hosts, vec!["b", "a"]);
    }

    #[test]
    fn test_name_and_path_must_both_match() {
        let hosts = vec![host("web").with_secret(generated("root", "root.age"))];
        let collected = collect(&hosts);
        let index = OwnerIndex::build("/repo", &collected);

        let err = index.resolve(&dependent(), &reference("root", "other.age")).unwrap_err();
        assert!(matches!(err, KeysmithError::UnresolvableDependency { ref dependent, .. } if dependent == "app:child"));
        assert!(index.resolve(&dependent(), &reference("rooty", "root.age")).is_err());
    }

    #[test]
    fn test_secret_without_generator_is_unresolvable() {
        let manual = SecretDecl {
            name: SecretName::new("manual").unwrap(),
            file: PathBuf::from("manual.age"),
            generator: None,
        };
        let hosts = vec![host("web").with_secret(manual)];
        let collected = collect(&hosts);
        let index = OwnerIndex::build("/repo", &collected);

        assert!(matches!(
            index.resolve(&dependent(), &reference("manual", "manual.age")),
            Err(KeysmithError::UnresolvableDependency { .. })
        ));
    }
}
