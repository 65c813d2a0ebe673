//! Execution backend capability seam.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::data_model::{CompiledArtifact, DeployedContract};
use crate::error::VerifyError;

/// One assertion event reported by the assertion library during a call,
/// in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionEvent {
    pub passed: bool,
    pub message: String,
}

/// A deployed library to splice into creation bytecode before submission.
#[derive(Debug, Clone)]
pub struct LinkedLibrary {
    /// Source file the link placeholders reference.
    pub file: String,
    /// Library name inside that file.
    pub name: String,
    /// Deployed address, `0x`-prefixed.
    pub address: String,
}

/// Remote environment that instantiates compiled contracts and runs their
/// entry points.
///
/// Both operations are bounded by the client's configured timeout and
/// distinguish "the code under test misbehaved" (revert errors) from "the
/// backend misbehaved" (unavailable/timeout errors). A call that completes
/// but reports failed assertions is a *successful* call: the failures come
/// back as [`AssertionEvent`]s, not as an `Err`.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Instantiate `artifact`, splicing `libraries` into its bytecode first.
    async fn deploy(
        &self,
        artifact: &CompiledArtifact,
        libraries: &[LinkedLibrary],
    ) -> Result<DeployedContract, VerifyError>;

    /// Invoke a zero-argument entry point by function name and decode the
    /// assertion events it emitted.
    async fn call(
        &self,
        contract: &DeployedContract,
        function: &str,
    ) -> Result<Vec<AssertionEvent>, VerifyError>;
}
