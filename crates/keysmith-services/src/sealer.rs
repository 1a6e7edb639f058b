//! Command-driven sealer.

use async_trait::async_trait;
use keysmith_core::util::run_async_with_input;
use keysmith_types::config::SealerConfig;
use keysmith_types::{KeysmithError, Result, Sealer};

/// Sealer running external commands.
///
/// The encrypt command reads plaintext on stdin and writes ciphertext to
/// stdout. The decrypt command is handed to generator scripts, which append
/// an artifact path and read plaintext from its stdout.
#[derive(Debug, Clone)]
pub struct CommandSealer {
    config: SealerConfig,
}

impl CommandSealer {
    /// Create a sealer from configuration.
    pub fn new(config: SealerConfig) -> Result<Self> {
        if config.encrypt.is_empty() {
            return Err(KeysmithError::Config("sealer.encrypt must not be empty".to_string()));
        }
        if config.decrypt.is_empty() {
            return Err(KeysmithError::Config("sealer.decrypt must not be empty".to_string()));
        }
        Ok(Self { config })
    }

    async fn invoke(&self, argv: &[String], input: &[u8]) -> Result<Vec<u8>> {
        let program = argv.first().map(String::as_str).unwrap_or_default();
        tracing::trace!(cmd = %argv.join(" "), "running sealer");

        let output = run_async_with_input(argv, input)
            .await
            .map_err(|e| KeysmithError::Encryption(format!("{}: {}", program, e)))?;

        if !output.success() {
            return Err(KeysmithError::Encryption(format!(
                "{} failed ({}): {}",
                program,
                output.status(),
                output.stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl Sealer for CommandSealer {
    async fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.invoke(&self.config.encrypt, plaintext).await
    }

    fn decrypt_command(&self) -> Vec<String> {
        self.config.decrypt.clone()
    }
}
