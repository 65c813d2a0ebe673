//! Unified error model for exercise verification.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything that can go wrong between receiving a bundle and grading it.
///
/// Display output follows a `FAMILY/DETAIL` code convention so log lines and
/// report fields stay greppable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// A unit failed to compile. This is the learner-facing outcome; the
    /// diagnostics are shown verbatim.
    #[error("COMPILE/{unit}: {n} diagnostic(s)", n = .diagnostics.len())]
    CompileError {
        unit: String,
        diagnostics: Vec<String>,
    },

    /// The compiler binary could not be launched or spoke garbage.
    #[error("SOLC/IO: {0}")]
    CompilerUnavailable(String),

    /// The execution backend could not be reached.
    #[error("BACKEND/UNAVAILABLE: {0}")]
    BackendUnavailable(String),

    /// A backend round trip exceeded its deadline.
    #[error("BACKEND/TIMEOUT: {0}")]
    BackendTimeout(String),

    /// Contract creation reverted.
    #[error("DEPLOY/REVERTED: {0}")]
    DeploymentReverted(String),

    /// A validation entry point reverted instead of reporting assertions.
    #[error("EXEC/REVERTED: {0}")]
    ExecutionReverted(String),

    /// Library address could not be spliced into the deploy bytecode.
    #[error("LINK/{0}")]
    LinkError(String),

    /// The one-time assertion-library bootstrap failed; no verification in
    /// this process can be graded.
    #[error("BOOTSTRAP/{0}")]
    BootstrapError(String),
}

impl VerifyError {
    /// Transient infrastructure faults worth a single retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::BackendTimeout(_)
        )
    }

    /// True when the failure is the learner's code failing to compile, as
    /// opposed to the grading infrastructure misbehaving.
    pub fn is_compile_failure(&self) -> bool {
        matches!(self, Self::CompileError { .. })
    }

    /// Stable short code for report fields and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CompileError { .. } => "COMPILE",
            Self::CompilerUnavailable(_) => "SOLC/IO",
            Self::BackendUnavailable(_) => "BACKEND/UNAVAILABLE",
            Self::BackendTimeout(_) => "BACKEND/TIMEOUT",
            Self::DeploymentReverted(_) => "DEPLOY/REVERTED",
            Self::ExecutionReverted(_) => "EXEC/REVERTED",
            Self::LinkError(_) => "LINK",
            Self::BootstrapError(_) => "BOOTSTRAP",
        }
    }
}

/// Pipeline stage a verification was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStage {
    Received,
    Merged,
    Compiled,
    Bootstrap,
    Deployed,
    Validated,
    Reported,
}

impl std::fmt::Display for VerifyStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Merged => "merged",
            Self::Compiled => "compiled",
            Self::Bootstrap => "bootstrap",
            Self::Deployed => "deployed",
            Self::Validated => "validated",
            Self::Reported => "reported",
        };
        write!(f, "{}", name)
    }
}
