//! Compiler capability seam.
use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::data_model::CompiledArtifact;
use crate::error::VerifyError;

/// Source-to-bytecode compiler for named units.
///
/// Implementations wrap a real compiler toolchain; the pipeline only ever
/// talks to this trait so tests can swap in a scripted compiler.
#[async_trait]
pub trait ContractCompiler: Send + Sync {
    /// Compile every unit in one call.
    ///
    /// Cross-unit references are allowed as long as the referenced
    /// declaration is present in the same call. Any unit failing to compile
    /// fails the whole call — partial artifact maps are never returned.
    /// Artifacts are grouped under the unit names passed in.
    async fn compile(
        &self,
        units: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, Vec<CompiledArtifact>>, VerifyError>;
}
