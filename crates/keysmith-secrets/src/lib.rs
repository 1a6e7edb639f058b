//! # Keysmith Secrets
//!
//! The generator dependency graph builder and incremental execution engine.
//!
//! A run goes through these stages:
//! - [`collector`]: gather every secret carrying a generator, across hosts
//! - [`resolver`]: attribute each dependency reference to its owning host
//! - [`index`]: render scripts and deduplicate declarations by storage path
//! - [`schedule`]: order entries so dependencies come first
//! - [`driver`]: regenerate stale entries, seal, persist, and stage them
//!
//! [`GenerationPlan::build`] wires the first four together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod collector;
pub mod resolver;
pub mod index;
pub mod schedule;
pub mod plan;
pub mod driver;
pub mod generator;

pub use index::{PlanWarning, ResolvedEntry, SecretIndex};
pub use plan::GenerationPlan;
pub use driver::{staleness, Driver, RunEvent, RunOptions, RunSummary};
pub use generator::{create_factory, Preset};
