//! Incremental execution of a generation plan.

use keysmith_core::time::format_mtime;
use keysmith_core::util::fs::modified_nanos;
use keysmith_types::{
    IndexStager, KeysmithError, Result, ScriptRunner, Sealer, StaleReason,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use zeroize::Zeroizing;

use crate::index::ResolvedEntry;
use crate::plan::GenerationPlan;

/// Floor for dependency timestamps, and the sentinel always compared.
const DEPENDENCY_FLOOR: u128 = 1;

/// Decide whether an entry must be regenerated.
///
/// `own` is the artifact's modification time, `None` when it does not
/// exist. `deps` holds the dependencies' modification times, `None` for a
/// missing dependency, which counts as the floor value 1. The floor is also
/// always compared, so an artifact stamped at the epoch is outdated.
pub fn staleness(own: Option<u128>, deps: &[Option<u128>], force: bool) -> Option<StaleReason> {
    let Some(own) = own else {
        return Some(StaleReason::Missing);
    };

    if force {
        return Some(StaleReason::Forced);
    }

    let newest = deps
        .iter()
        .map(|d| d.unwrap_or(DEPENDENCY_FLOOR))
        .chain(std::iter::once(DEPENDENCY_FLOOR))
        .max()
        .unwrap_or(DEPENDENCY_FLOOR);

    (newest > own).then_some(StaleReason::Outdated)
}

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Normalised storage paths to consider; empty means every entry
    pub targets: HashSet<PathBuf>,
    /// Regenerate selected entries even when up to date
    pub force: bool,
}

/// Progress reported while running.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    /// The entry's generator is about to run
    Started {
        /// The entry
        entry: &'a ResolvedEntry,
        /// Why it is regenerated
        reason: StaleReason,
    },
    /// The entry was generated, sealed and written
    Generated {
        /// The entry
        entry: &'a ResolvedEntry,
        /// Why it was regenerated
        reason: StaleReason,
    },
    /// The entry is up to date
    Skipped {
        /// The entry
        entry: &'a ResolvedEntry,
    },
}

/// Counts for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries regenerated
    pub generated: usize,
    /// Entries found up to date
    pub skipped: usize,
    /// Entries outside the target selection
    pub unselected: usize,
}

/// Runs generators, seals their output, and persists the artifacts.
pub struct Driver {
    sealer: Box<dyn Sealer>,
    runner: Box<dyn ScriptRunner>,
    stager: Option<Box<dyn IndexStager>>,
}

impl Driver {
    /// Create a driver.
    pub fn new(sealer: Box<dyn Sealer>, runner: Box<dyn ScriptRunner>) -> Self {
        Self {
            sealer,
            runner,
            stager: None,
        }
    }

    /// Stage every written artifact through `stager`.
    pub fn with_stager(mut self, stager: Box<dyn IndexStager>) -> Self {
        self.stager = Some(stager);
        self
    }

    /// Process the plan's entries in schedule order, one at a time.
    ///
    /// Stops at the first error; artifacts already written stay in place.
    pub async fn run<F>(
        &self,
        plan: &GenerationPlan,
        options: &RunOptions,
        mut on_event: F,
    ) -> Result<RunSummary>
    where
        F: FnMut(RunEvent<'_>),
    {
        let mut summary = RunSummary::default();

        for entry in plan.ordered() {
            if !options.targets.is_empty() && !options.targets.contains(&entry.file) {
                summary.unselected += 1;
                continue;
            }

            let own = modified_nanos(&entry.file)?;
            let deps = entry
                .dependency_files()
                .map(modified_nanos)
                .collect::<Result<Vec<_>>>()?;
            tracing::debug!(
                file = %entry.file.display(),
                modified = %own.map(format_mtime).unwrap_or_else(|| "absent".to_string()),
                dependencies = ?deps,
                "timestamps"
            );

            let Some(reason) = staleness(own, &deps, options.force) else {
                tracing::info!(file = %entry.file.display(), "up to date");
                on_event(RunEvent::Skipped { entry });
                summary.skipped += 1;
                continue;
            };

            on_event(RunEvent::Started { entry, reason });
            self.generate(entry, reason).await?;
            on_event(RunEvent::Generated { entry, reason });
            summary.generated += 1;
        }

        Ok(summary)
    }

    async fn generate(&self, entry: &ResolvedEntry, reason: StaleReason) -> Result<()> {
        let started = Instant::now();
        tracing::info!(
            file = %entry.file.display(),
            %reason,
            generator = %entry.generator,
            "generating {}",
            entry.describe_definitions()
        );

        let output = self.runner.run(&entry.script).await?;
        if !output.success() {
            return Err(KeysmithError::GeneratorFailure {
                file: entry.file.clone(),
                status: output.status(),
                stderr: output.stderr.trim_end().to_string(),
            });
        }
        if !output.stderr.is_empty() {
            tracing::debug!(file = %entry.file.display(), stderr = %output.stderr.trim_end(), "generator stderr");
        }

        let plaintext = Zeroizing::new(output.stdout);
        let ciphertext = self.sealer.encrypt(&plaintext).await?;

        if let Some(parent) = entry.file.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| KeysmithError::persist(&entry.file, e))?;
        }
        tokio::fs::write(&entry.file, &ciphertext)
            .await
            .map_err(|e| KeysmithError::persist(&entry.file, e))?;

        if let Some(stager) = &self.stager {
            stager.stage(&entry.file).await?;
        }

        tracing::debug!(
            file = %entry.file.display(),
            bytes = ciphertext.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "wrote artifact"
        );
        Ok(())
    }
}
