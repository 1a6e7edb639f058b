//! Generation plan: every generated secret of a repository, in dependency order.

use indexmap::IndexMap;
use keysmith_core::util::fs::normalize_path;
use keysmith_inventory::Inventory;
use keysmith_types::{KeysmithError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::collector::collect;
use crate::index::{PlanWarning, ResolvedEntry, SecretIndex};
use crate::resolver::OwnerIndex;
use crate::schedule::schedule;

/// Resolved, deduplicated and ordered generated secrets.
#[derive(Debug)]
pub struct GenerationPlan {
    entries: IndexMap<PathBuf, ResolvedEntry>,
    order: Vec<PathBuf>,
    warnings: Vec<PlanWarning>,
}

impl GenerationPlan {
    /// Build the plan for every host of `inventory`.
    ///
    /// `decrypt` is the sealer's decrypt command line, exposed to generator
    /// templates. Fails on conflicting declarations, unresolvable
    /// dependencies, and dependency cycles.
    pub fn build(inventory: &Inventory, decrypt: &[String]) -> Result<Self> {
        let collected = collect(inventory.hosts());
        let owners = OwnerIndex::build(inventory.root(), &collected);

        let mut index = SecretIndex::new(inventory.root(), decrypt.to_vec());
        for item in &collected {
            index.merge(item, &owners)?;
        }
        let (entries, warnings) = index.into_parts();

        let order: Vec<PathBuf> = schedule(&entries)?
            .into_iter()
            .map(|entry| entry.file.clone())
            .collect();

        tracing::debug!(
            declarations = collected.len(),
            entries = entries.len(),
            warnings = warnings.len(),
            "built generation plan"
        );

        Ok(Self {
            entries,
            order,
            warnings,
        })
    }

    /// Entries in schedule order.
    pub fn ordered(&self) -> impl Iterator<Item = &ResolvedEntry> {
        self.order.iter().filter_map(|file| self.entries.get(file))
    }

    /// Look up an entry by normalised storage path.
    pub fn get(&self, file: &Path) -> Option<&ResolvedEntry> {
        self.entries.get(file)
    }

    /// Warnings collected while building.
    pub fn warnings(&self) -> &[PlanWarning] {
        &self.warnings
    }

    /// Number of distinct secrets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the repository declares no generated secret.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalise `targets` against `cwd` and check each names a managed secret.
    ///
    /// Fails with `UnknownTarget` on the first target matching no entry.
    pub fn resolve_targets(&self, cwd: &Path, targets: &[PathBuf]) -> Result<HashSet<PathBuf>> {
        targets
            .iter()
            .map(|target| {
                let file = normalize_path(cwd, target);
                if self.entries.contains_key(&file) {
                    Ok(file)
                } else {
                    Err(KeysmithError::UnknownTarget(target.clone()))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keysmith_inventory::InventoryBuilder;
    use keysmith_types::{GeneratorDecl, HostDecl, HostName, SecretDecl, SecretName};

    fn secret(name: &str, file: &str, generator: GeneratorDecl) -> SecretDecl {
        SecretDecl {
            name: SecretName::new(name).unwrap(),
            file: PathBuf::from(file),
            generator: Some(generator),
        }
    }

    fn derived(name: &str, file: &str, deps: &[(&str, &str)]) -> SecretDecl {
        let generator = deps.iter().fold(
            GeneratorDecl::script("cat {{deps.0.file}}"),
            |g, (dep, file)| g.depends_on(SecretName::new(dep).unwrap(), *file),
        );
        secret(name, file, generator)
    }

    fn host(name: &str) -> HostDecl {
        HostDecl::new(HostName::new(name).unwrap())
    }

    fn order(plan: &GenerationPlan) -> Vec<String> {
        plan.ordered()
            .map(|e| e.file.strip_prefix("/repo").unwrap().display().to_string())
            .collect()
    }

    fn fleet() -> Inventory {
        InventoryBuilder::new("/repo")
            .host(
                host("app")
                    .with_secret(derived("token", "token.age", &[("root", "root.age")]))
                    .with_secret(SecretDecl {
                        name: SecretName::new("manual").unwrap(),
                        file: PathBuf::from("manual.age"),
                        generator: None,
                    }),
            )
            .host(host("ca").with_secret(secret("root", "root.age", GeneratorDecl::preset("hex"))))
            .host(host("db").with_secret(derived("token", "token.age", &[("root", "root.age")])))
            .build()
    }

    #[test]
    fn test_build_orders_and_deduplicates() {
        let plan = GenerationPlan::build(&fleet(), &["cat".to_string()]).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(order(&plan), vec!["root.age", "token.age"]);
        assert!(plan.warnings().is_empty());

        let token = plan.get(Path::new("/repo/token.age")).unwrap();
        assert_eq!(token.describe_definitions(), "app:token, db:token");
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = GenerationPlan::build(&fleet(), &[]).unwrap();
        let second = GenerationPlan::build(&fleet(), &[]).unwrap();

        assert_eq!(order(&first), order(&second));
        let scripts = |p: &GenerationPlan| p.ordered().map(|e| e.script.clone()).collect::<Vec<_>>();
        assert_eq!(scripts(&first), scripts(&second));
    }

    #[test]
    fn test_build_rejects_cycle() {
        let inventory = InventoryBuilder::new("/repo")
            .host(
                host("h")
                    .with_secret(derived("a", "a.age", &[("b", "b.age")]))
                    .with_secret(derived("b", "b.age", &[("a", "a.age")])),
            )
            .build();

        match GenerationPlan::build(&inventory, &[]).unwrap_err() {
            KeysmithError::CyclicDependency { cycle } => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_build_rejects_unresolvable_dependency() {
        let inventory = InventoryBuilder::new("/repo")
            .host(host("h").with_secret(derived("a", "a.age", &[("nope", "nope.age")])))
            .build();

        assert!(matches!(
            GenerationPlan::build(&inventory, &[]),
            Err(KeysmithError::UnresolvableDependency { .. })
        ));
    }

    #[test]
    fn test_empty_inventory() {
        let plan = GenerationPlan::build(&InventoryBuilder::new("/repo").build(), &[]).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.ordered().count(), 0);
    }

    #[test]
    fn test_resolve_targets() {
        let plan = GenerationPlan::build(&fleet(), &[]).unwrap();

        let targets = plan
            .resolve_targets(Path::new("/repo"), &[PathBuf::from("./token.age")])
            .unwrap();
        assert!(targets.contains(Path::new("/repo/token.age")));

        let err = plan
            .resolve_targets(Path::new("/repo"), &[PathBuf::from("root.age"), PathBuf::from("manual.age")])
            .unwrap_err();
        assert!(matches!(err, KeysmithError::UnknownTarget(p) if p == PathBuf::from("manual.age")));
    }
}
