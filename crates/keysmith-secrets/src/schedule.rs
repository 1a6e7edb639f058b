//! Dependency ordering of resolved entries.

use indexmap::IndexMap;
use keysmith_types::{bug, KeysmithError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::index::ResolvedEntry;

/// Order entries so every dependency comes before its dependents.
///
/// Entries are visited depth first in index order, each entry's dependencies
/// in declaration order, and emitted in post-order. The result is therefore
/// stable for a given index.
pub fn schedule(entries: &IndexMap<PathBuf, ResolvedEntry>) -> Result<Vec<&ResolvedEntry>> {
    let order = topo_order(entries, |entry| {
        entry.dependency_files().collect::<Vec<_>>()
    })?;
    order
        .into_iter()
        .map(|key| {
            entries
                .get(key)
                .ok_or_else(|| KeysmithError::Bug(format!("{} vanished while scheduling", key.display())))
        })
        .collect()
}

/// Depth-first post-order over any path-keyed graph.
///
/// `deps` lists the keys a node depends on. Reaching a node already on the
/// current path is a cycle, reported from its first occurrence back to
/// itself; a node depending on itself is a cycle of length one.
pub fn topo_order<'a, T, F>(nodes: &'a IndexMap<PathBuf, T>, deps: F) -> Result<Vec<&'a PathBuf>>
where
    F: Fn(&'a T) -> Vec<&'a Path>,
{
    let mut sorted = Vec::with_capacity(nodes.len());
    let mut done = HashSet::new();
    let mut path = Vec::new();

    fn visit<'a, T, F>(
        key: &'a PathBuf,
        node: &'a T,
        nodes: &'a IndexMap<PathBuf, T>,
        deps: &F,
        done: &mut HashSet<&'a Path>,
        path: &mut Vec<&'a PathBuf>,
        sorted: &mut Vec<&'a PathBuf>,
    ) -> Result<()>
    where
        F: Fn(&'a T) -> Vec<&'a Path>,
    {
        if done.contains(key.as_path()) {
            return Ok(());
        }

        if let Some(start) = path.iter().position(|p| *p == key) {
            let mut cycle: Vec<PathBuf> = path[start..].iter().map(|p| (*p).clone()).collect();
            cycle.push(key.clone());
            return Err(KeysmithError::CyclicDependency { cycle });
        }

        path.push(key);

        for dep in deps(node) {
            let Some((dep_key, dep_node)) = nodes.get_key_value(dep) else {
                bug!(
                    "{} depends on {}, which is not indexed",
                    key.display(),
                    dep.display()
                );
            };
            visit(dep_key, dep_node, nodes, deps, done, path, sorted)?;
        }

        path.pop();
        done.insert(key.as_path());
        sorted.push(key);

        Ok(())
    }

    for (key, node) in nodes {
        visit(key, node, nodes, &deps, &mut done, &mut path, &mut sorted)?;
    }

    Ok(sorted)
}
