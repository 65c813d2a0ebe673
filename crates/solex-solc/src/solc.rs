//! The subprocess-backed compiler implementation.
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use solex_core::{CompiledArtifact, ContractCompiler, VerifierConfig, VerifyError};

use crate::standard_json;

/// Compiler adapter invoking `solc --standard-json` once per compile call.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    solc_path: String,
}

impl SolcCompiler {
    pub fn new(solc_path: impl Into<String>) -> Self {
        Self {
            solc_path: solc_path.into(),
        }
    }

    pub fn from_config(config: &VerifierConfig) -> Self {
        Self::new(config.solc_path.clone())
    }
}

#[async_trait]
impl ContractCompiler for SolcCompiler {
    async fn compile(
        &self,
        units: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, Vec<CompiledArtifact>>, VerifyError> {
        let input = standard_json::build_input(units);
        let payload = serde_json::to_vec(&input)
            .map_err(|error| VerifyError::CompilerUnavailable(error.to_string()))?;

        tracing::debug!(units = units.len(), solc = %self.solc_path, "compiling");

        let mut child = Command::new(&self.solc_path)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| {
                VerifyError::CompilerUnavailable(format!(
                    "failed to launch {}: {error}",
                    self.solc_path
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await.map_err(|error| {
                VerifyError::CompilerUnavailable(format!("failed to feed solc: {error}"))
            })?;
            // closing stdin lets solc start compiling
        }

        let output = child.wait_with_output().await.map_err(|error| {
            VerifyError::CompilerUnavailable(format!("failed to wait for solc: {error}"))
        })?;

        // solc exits 0 even when the sources have compile errors; a non-zero
        // status means the invocation itself went wrong.
        if !output.status.success() {
            return Err(VerifyError::CompilerUnavailable(format!(
                "solc exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let raw = String::from_utf8_lossy(&output.stdout);
        standard_json::parse_output(units, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_compiler_unavailable() {
        let compiler = SolcCompiler::new("/definitely/not/solc");
        let units: BTreeMap<String, String> =
            [("validation".to_string(), "contract T {}".to_string())].into();
        let error = compiler.compile(&units).await.unwrap_err();
        assert!(matches!(error, VerifyError::CompilerUnavailable(_)));
        // an invocation failure must never read as a learner compile error
        assert!(!error.is_compile_failure());
    }
}
