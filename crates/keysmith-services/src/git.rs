//! Git index staging.

use async_trait::async_trait;
use keysmith_types::{IndexStager, KeysmithError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Stages paths with `git add` in a repository.
#[derive(Debug, Clone)]
pub struct GitStager {
    root: PathBuf,
}

impl GitStager {
    /// Create a stager for the repository at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl IndexStager for GitStager {
    async fn stage(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        run_git(&self.root, &["add", "--", &path]).await.map(|_| ())
    }
}

async fn run_git(root: &Path, args: &[&str]) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(root).args(args);

    tracing::trace!(
        cmd = %format!("git -C {} {}", root.display(), args.join(" ")),
        "running git command"
    );

    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            KeysmithError::VcsStage("git not found in PATH".to_string())
        } else {
            KeysmithError::VcsStage(format!("failed to run git: {}", e))
        }
    })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(KeysmithError::VcsStage(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}
