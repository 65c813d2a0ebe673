//! Environment-driven configuration.
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_SOLC_PATH: &str = "solc";
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_GAS_LIMIT: u64 = 6_000_000;

/// Whether verifications actually reach the execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Compile, deploy, and grade.
    Full,
    /// Compile only. Deployment, grading, and the assertion-library
    /// bootstrap are all skipped so local book builds stay fast.
    CompileOnly,
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub mode: ExecutionMode,
    pub rpc_url: String,
    pub solc_path: String,
    /// Deadline for every backend round trip, receipt polling included.
    pub call_timeout: Duration,
    pub gas_limit: u64,
}

impl VerifierConfig {
    /// Read configuration from the process environment.
    ///
    /// Setting `SOLEX_WRITE_MODE` (any value) selects compile-only mode,
    /// mirroring the writers' quick-iteration switch.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`VerifierConfig::from_env`] but with an injected lookup so
    /// tests never touch the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = if lookup("SOLEX_WRITE_MODE").is_some() {
            ExecutionMode::CompileOnly
        } else {
            ExecutionMode::Full
        };
        let call_timeout = lookup("SOLEX_CALL_TIMEOUT_MS")
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS));
        let gas_limit = lookup("SOLEX_GAS_LIMIT")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_GAS_LIMIT);

        Self {
            mode,
            rpc_url: lookup("SOLEX_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            solc_path: lookup("SOLEX_SOLC_PATH").unwrap_or_else(|| DEFAULT_SOLC_PATH.to_string()),
            call_timeout,
            gas_limit,
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::default();
        assert_eq!(config.mode, ExecutionMode::Full);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.solc_path, DEFAULT_SOLC_PATH);
        assert_eq!(config.call_timeout, Duration::from_millis(DEFAULT_CALL_TIMEOUT_MS));
        assert_eq!(config.gas_limit, DEFAULT_GAS_LIMIT);
    }

    #[test]
    fn test_write_mode_disables_execution() {
        let config = VerifierConfig::from_lookup(|key| {
            (key == "SOLEX_WRITE_MODE").then(|| "1".to_string())
        });
        assert_eq!(config.mode, ExecutionMode::CompileOnly);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = VerifierConfig::from_lookup(|key| match key {
            "SOLEX_RPC_URL" => Some("http://10.0.0.2:8545".to_string()),
            "SOLEX_SOLC_PATH" => Some("/opt/solc/solc".to_string()),
            "SOLEX_CALL_TIMEOUT_MS" => Some("2500".to_string()),
            "SOLEX_GAS_LIMIT" => Some("not a number".to_string()),
            _ => None,
        });
        assert_eq!(config.rpc_url, "http://10.0.0.2:8545");
        assert_eq!(config.solc_path, "/opt/solc/solc");
        assert_eq!(config.call_timeout, Duration::from_millis(2500));
        // unparsable values fall back to the default
        assert_eq!(config.gas_limit, DEFAULT_GAS_LIMIT);
    }
}
