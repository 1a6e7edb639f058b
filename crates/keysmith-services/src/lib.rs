//! # Keysmith Services
//!
//! Implementations of the collaborators the generation engine talks to:
//! - **Sealer**: encryption through configurable commands (age, rage, ...)
//! - **Git**: staging written artifacts into the index

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod sealer;
pub mod git;

pub use sealer::CommandSealer;
pub use git::GitStager;
