//! Solex Core: data model, error taxonomy, and capability seams
//!
//! Shared foundation for the exercise verification pipeline: the typed
//! source bundle, the compiled/deployed artifact model, the unified error
//! taxonomy, and the `ContractCompiler`/`ExecutionBackend` traits whose
//! concrete implementations live in `solex-solc` and `solex-chain`.

pub mod backend;
pub mod bundle;
pub mod compiler;
pub mod config;
pub mod data_model;
pub mod error;

pub use backend::{AssertionEvent, ExecutionBackend, LinkedLibrary};
pub use bundle::SourceBundle;
pub use compiler::ContractCompiler;
pub use config::{ExecutionMode, VerifierConfig};
pub use data_model::{
    AssertionResult, CompileFailure, CompiledArtifact, DeployedContract, Grading, InfraFailure,
    ReportOutcome, StageTrace, VerificationReport,
};
pub use error::{VerifyError, VerifyStage};

/// Engine version reported by the API health endpoint.
pub const SOLEX_VERSION: &str = env!("CARGO_PKG_VERSION");
