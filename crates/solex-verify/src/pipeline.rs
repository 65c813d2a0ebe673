//! The verification pipeline: Received → Merged → Compiled →
//! (ExecutionSkipped | Deployed → Validated) → Reported.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use solex_core::{
    AssertionResult, CompiledArtifact, ContractCompiler, DeployedContract, ExecutionBackend,
    ExecutionMode, Grading, LinkedLibrary, SourceBundle, StageTrace, VerificationReport,
    VerifierConfig, VerifyError, VerifyStage,
};

use crate::bootstrap::{LibraryBootstrap, ASSERT_FILE, ASSERT_LIBRARY};
use crate::merge;
use crate::report;

/// What a run that reached `Reported` hands the assembler.
pub struct PipelineOutcome {
    pub artifacts: BTreeMap<String, Vec<CompiledArtifact>>,
    /// `None` when execution was skipped.
    pub grading: Option<Grading>,
}

/// A run that died, tagged with the stage it died in.
pub struct StageFailure {
    pub stage: VerifyStage,
    pub error: VerifyError,
    /// Artifacts produced before the failure.
    pub artifacts: BTreeMap<String, Vec<CompiledArtifact>>,
}

impl StageFailure {
    fn new(stage: VerifyStage, error: VerifyError) -> Self {
        Self {
            stage,
            error,
            artifacts: BTreeMap::new(),
        }
    }

    fn with_artifacts(
        stage: VerifyStage,
        error: VerifyError,
        artifacts: &BTreeMap<String, Vec<CompiledArtifact>>,
    ) -> Self {
        Self {
            stage,
            error,
            artifacts: artifacts.clone(),
        }
    }
}

/// Drives verifications against a compiler and an execution backend.
///
/// One `Verifier` serves many concurrent verifications; the only shared
/// mutable state is the assertion-library bootstrap, which collapses
/// concurrent first-callers into a single compile+deploy.
pub struct Verifier {
    compiler: Arc<dyn ContractCompiler>,
    backend: Arc<dyn ExecutionBackend>,
    bootstrap: Arc<LibraryBootstrap>,
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(
        compiler: Arc<dyn ContractCompiler>,
        backend: Arc<dyn ExecutionBackend>,
        config: VerifierConfig,
    ) -> Self {
        Self {
            compiler,
            backend,
            bootstrap: Arc::new(LibraryBootstrap::new()),
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify one bundle. Total: every failure folds into the report, so
    /// the host always gets something renderable back.
    pub async fn verify(&self, bundle: SourceBundle) -> VerificationReport {
        let verification_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(%verification_id, "verification received");

        let mut stage_trace = Vec::new();
        let outcome = self.run(&bundle, &verification_id, &mut stage_trace).await;
        let report = report::assemble(verification_id, &bundle, outcome, stage_trace);

        tracing::info!(
            verification_id = %report.verification_id,
            outcome = ?report.outcome,
            "verification reported"
        );
        report
    }

    async fn run(
        &self,
        bundle: &SourceBundle,
        verification_id: &str,
        stage_trace: &mut Vec<StageTrace>,
    ) -> Result<PipelineOutcome, StageFailure> {
        let started = Instant::now();
        let units = merge::build_units(bundle);
        record(stage_trace, VerifyStage::Merged, started);

        let started = Instant::now();
        let artifacts = self
            .compiler
            .compile(&units)
            .await
            .map_err(|error| StageFailure::new(VerifyStage::Compiled, error))?;
        record(stage_trace, VerifyStage::Compiled, started);
        tracing::debug!(%verification_id, units = artifacts.len(), "compiled");

        if self.config.mode == ExecutionMode::CompileOnly {
            tracing::debug!(%verification_id, "execution disabled, skipping deployment");
            return Ok(PipelineOutcome {
                artifacts,
                grading: None,
            });
        }

        let started = Instant::now();
        let library = self
            .bootstrap
            .ensure(self.compiler.clone(), self.backend.clone())
            .await
            .map_err(|error| {
                StageFailure::with_artifacts(VerifyStage::Bootstrap, error, &artifacts)
            })?;
        record(stage_trace, VerifyStage::Bootstrap, started);

        let libraries = [LinkedLibrary {
            file: ASSERT_FILE.to_string(),
            name: ASSERT_LIBRARY.to_string(),
            address: library.address.clone(),
        }];
        let test_artifacts: Vec<&CompiledArtifact> = artifacts
            .get(merge::VALIDATION_UNIT)
            .map(|list| list.iter().filter(|a| a.is_test_contract()).collect())
            .unwrap_or_default();

        let started = Instant::now();
        let mut deployed: Vec<(&CompiledArtifact, DeployedContract)> = Vec::new();
        for artifact in test_artifacts {
            let contract = self
                .backend
                .deploy(artifact, &libraries)
                .await
                .map_err(|error| {
                    StageFailure::with_artifacts(VerifyStage::Deployed, error, &artifacts)
                })?;
            deployed.push((artifact, contract));
        }
        record(stage_trace, VerifyStage::Deployed, started);
        tracing::debug!(%verification_id, contracts = deployed.len(), "deployed");

        let started = Instant::now();
        let mut assertion_results = Vec::new();
        for (artifact, contract) in &deployed {
            for function in artifact.test_entry_points() {
                let events = self
                    .backend
                    .call(contract, &function)
                    .await
                    .map_err(|error| {
                        StageFailure::with_artifacts(VerifyStage::Validated, error, &artifacts)
                    })?;
                for event in events {
                    assertion_results.push(AssertionResult {
                        index: assertion_results.len(),
                        description: format!("{}.{}", contract.contract, function),
                        passed: event.passed,
                        message: event.message,
                    });
                }
            }
        }
        record(stage_trace, VerifyStage::Validated, started);

        let deployed_contracts = deployed.into_iter().map(|(_, contract)| contract).collect();
        Ok(PipelineOutcome {
            artifacts,
            grading: Some(Grading {
                deployed_contracts,
                assertion_results,
            }),
        })
    }
}

fn record(stage_trace: &mut Vec<StageTrace>, stage: VerifyStage, started: Instant) {
    stage_trace.push(StageTrace {
        stage,
        latency_ms: started.elapsed().as_millis() as u64,
    });
}
