//! Data model: compiled artifacts, deployed contracts, and the report.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{VerifyError, VerifyStage};

/// One contract produced by compiling a named unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledArtifact {
    /// Compilation unit (fragment name) this contract came from.
    pub unit: String,
    /// Contract name inside the unit.
    pub contract: String,
    /// Creation bytecode, hex without `0x` prefix. May contain unresolved
    /// library link placeholders until [`CompiledArtifact::link`] runs.
    pub bytecode: String,
    /// Solidity JSON ABI, in declaration order.
    pub abi: Value,
    /// solc link references: `file -> library -> [{start, length}]`.
    pub link_references: Value,
    /// Content address of the artifact.
    pub artifact_hash: String,
}

impl CompiledArtifact {
    pub fn new(
        unit: impl Into<String>,
        contract: impl Into<String>,
        bytecode: impl Into<String>,
        abi: Value,
        link_references: Value,
    ) -> Self {
        let bytecode = bytecode.into();
        let artifact_hash = format!("blake3:{}", blake3::hash(bytecode.as_bytes()));
        Self {
            unit: unit.into(),
            contract: contract.into(),
            bytecode,
            abi,
            link_references,
            artifact_hash,
        }
    }

    /// Fully-qualified name, `unit:Contract`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.unit, self.contract)
    }

    /// Zero-argument `test*` functions, in ABI declaration order.
    pub fn test_entry_points(&self) -> Vec<String> {
        let Some(entries) = self.abi.as_array() else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|entry| {
                entry.get("type").and_then(Value::as_str) == Some("function")
                    && entry
                        .get("inputs")
                        .and_then(Value::as_array)
                        .map_or(true, |inputs| inputs.is_empty())
            })
            .filter_map(|entry| entry.get("name").and_then(Value::as_str))
            .filter(|name| name.starts_with("test"))
            .map(str::to_string)
            .collect()
    }

    /// True when this contract is deployable and carries graded entry points.
    pub fn is_test_contract(&self) -> bool {
        !self.bytecode.is_empty() && !self.test_entry_points().is_empty()
    }

    /// Splice a deployed library address over every link placeholder that
    /// references `file`/`library`, returning the linked bytecode.
    pub fn link(&self, file: &str, library: &str, address: &str) -> Result<String, VerifyError> {
        let addr = address.strip_prefix("0x").unwrap_or(address).to_lowercase();
        if addr.len() != 40 || !addr.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(VerifyError::LinkError(format!(
                "invalid library address {address}"
            )));
        }

        let mut bytecode = self.bytecode.clone();
        let sites = self
            .link_references
            .get(file)
            .and_then(|libs| libs.get(library))
            .and_then(Value::as_array);
        if let Some(sites) = sites {
            for site in sites {
                let start = site
                    .get("start")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| VerifyError::LinkError("link site missing start".into()))?
                    as usize
                    * 2;
                let length = site.get("length").and_then(Value::as_u64).unwrap_or(20) as usize * 2;
                if length != addr.len() || start + length > bytecode.len() {
                    return Err(VerifyError::LinkError(format!(
                        "link site {start}+{length} out of range for {}",
                        self.qualified_name()
                    )));
                }
                bytecode.replace_range(start..start + length, &addr);
            }
        }
        Ok(bytecode)
    }
}

/// A contract instance created on the execution backend. Addresses are
/// session-scoped; nothing here survives a backend restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployedContract {
    pub unit: String,
    pub contract: String,
    /// Backend-assigned address, `0x`-prefixed.
    pub address: String,
    /// Content hash of the artifact this instance was created from.
    pub artifact_hash: String,
}

/// One assertion outcome, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub index: usize,
    /// `Contract.function` the assertion ran inside.
    pub description: String,
    pub passed: bool,
    pub message: String,
}

/// Grading output. Deployment info and assertion results only ever appear
/// together, so they share one optional struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grading {
    pub deployed_contracts: Vec<DeployedContract>,
    pub assertion_results: Vec<AssertionResult>,
}

impl Grading {
    pub fn passed(&self) -> bool {
        self.assertion_results.iter().all(|result| result.passed)
    }
}

/// Learner-facing compile failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileFailure {
    pub unit: String,
    pub diagnostics: Vec<String>,
}

/// Grading-infrastructure failure; shown as "could not grade", never as a
/// wrong answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfraFailure {
    pub stage: VerifyStage,
    pub code: String,
    pub message: String,
}

/// Wall-clock trace of one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTrace {
    pub stage: VerifyStage,
    pub latency_ms: u64,
}

/// Overall verdict of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportOutcome {
    /// Every assertion passed.
    Passed,
    /// Validation ran to completion and reported at least one failure.
    AssertionsFailed,
    /// The submission did not compile.
    CompileError,
    /// Execution disabled; artifacts only.
    NotGraded,
    /// The grading infrastructure failed; the submission was not judged.
    InfraFailure,
}

/// The renderable unit handed back to the host for every verification,
/// successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub verification_id: String,
    pub ts: DateTime<Utc>,
    pub outcome: ReportOutcome,
    /// Artifacts grouped by unit name; unit names are exactly the fragment
    /// names handed to the compiler.
    pub artifacts: BTreeMap<String, Vec<CompiledArtifact>>,
    pub grading: Option<Grading>,
    pub compile_error: Option<CompileFailure>,
    pub infra_error: Option<InfraFailure>,
    /// Fenced code block holding the reference solution.
    pub rendered_hint: String,
    pub stage_trace: Vec<StageTrace>,
}
