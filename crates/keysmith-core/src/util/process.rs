//! Process execution utilities.

use async_trait::async_trait;
use keysmith_types::{KeysmithError, Result, ScriptOutput, ScriptRunner};
use std::io;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Execute `argv`, feeding `input` on stdin, and capture raw output.
pub async fn run_async_with_input(argv: &[String], input: &[u8]) -> Result<ScriptOutput> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| KeysmithError::Validation("empty command line".to_string()))?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| spawn_error(program, e))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| KeysmithError::Bug("child stdin was not piped".to_string()))?;

    let write = async move {
        match stdin.write_all(input).await {
            // The child may legitimately ignore its input
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other,
        }
    };

    let ((), output) = tokio::try_join!(write, child.wait_with_output())?;

    Ok(ScriptOutput {
        stdout: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        code: output.status.code(),
    })
}

fn spawn_error(program: &str, e: io::Error) -> KeysmithError {
    if e.kind() == io::ErrorKind::NotFound {
        KeysmithError::Other(format!("command not found: {}", program))
    } else {
        KeysmithError::Io(e)
    }
}

/// Runs generator scripts through an interpreter such as `sh -c`.
///
/// The script is passed as a single argument after the interpreter argv, so
/// it is never re-quoted. Scripts get an empty stdin.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: Vec<String>,
}

impl ShellRunner {
    /// Create a runner for the given interpreter argv.
    pub fn new(shell: Vec<String>) -> Self {
        Self { shell }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(vec!["sh".to_string(), "-c".to_string()])
    }
}

#[async_trait]
impl ScriptRunner for ShellRunner {
    async fn run(&self, script: &str) -> Result<ScriptOutput> {
        let (program, args) = self
            .shell
            .split_first()
            .ok_or_else(|| KeysmithError::Config("shell must name an interpreter".to_string()))?;

        tracing::trace!(shell = %program, "running generator script");

        let output = Command::new(program)
            .args(args)
            .arg(script)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| spawn_error(program, e))?;

        Ok(ScriptOutput {
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_with_input_pipes_stdin() {
        let argv = vec!["cat".to_string()];
        let out = run_async_with_input(&argv, b"sealed").await.unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, b"sealed");
    }

    #[tokio::test]
    async fn test_run_with_input_empty_argv() {
        assert!(run_async_with_input(&[], b"").await.is_err());
    }

    #[tokio::test]
    async fn test_shell_runner_reports_failure() {
        let runner = ShellRunner::default();
        let out = runner.run("echo oops >&2; exit 3").await.unwrap();
        assert!(!out.success());
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr.trim(), "oops");
        assert_eq!(out.status(), "exit status 3");
    }

    #[tokio::test]
    async fn test_shell_runner_missing_interpreter() {
        let runner = ShellRunner::new(vec!["/nonexistent/shell".to_string()]);
        let err = runner.run("true").await.unwrap_err();
        assert!(err.to_string().contains("command not found"));
    }
}
