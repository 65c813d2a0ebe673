//! Report assembly: every pipeline outcome becomes a renderable report.
use chrono::Utc;

use solex_core::{
    CompileFailure, InfraFailure, ReportOutcome, SourceBundle, StageTrace, VerificationReport,
    VerifyError,
};

use crate::pipeline::{PipelineOutcome, StageFailure};

/// Fence the reference solution as a code block; rendering the markup is
/// the host's job.
pub fn render_hint(solution: &str) -> String {
    format!("```solidity\n{solution}\n```")
}

/// Pure assembly of the final report. No side effects and no failure modes
/// of its own: upstream failures become report fields.
pub fn assemble(
    verification_id: String,
    bundle: &SourceBundle,
    outcome: Result<PipelineOutcome, StageFailure>,
    stage_trace: Vec<StageTrace>,
) -> VerificationReport {
    let rendered_hint = render_hint(&bundle.solution);

    match outcome {
        Ok(PipelineOutcome { artifacts, grading }) => {
            let outcome = match &grading {
                None => ReportOutcome::NotGraded,
                Some(grading) if grading.passed() => ReportOutcome::Passed,
                Some(_) => ReportOutcome::AssertionsFailed,
            };
            VerificationReport {
                verification_id,
                ts: Utc::now(),
                outcome,
                artifacts,
                grading,
                compile_error: None,
                infra_error: None,
                rendered_hint,
                stage_trace,
            }
        }
        Err(StageFailure {
            stage,
            error,
            artifacts,
        }) => {
            let (outcome, compile_error, infra_error) = match &error {
                VerifyError::CompileError { unit, diagnostics } => (
                    ReportOutcome::CompileError,
                    Some(CompileFailure {
                        unit: unit.clone(),
                        diagnostics: diagnostics.clone(),
                    }),
                    None,
                ),
                other => (
                    ReportOutcome::InfraFailure,
                    None,
                    Some(InfraFailure {
                        stage,
                        code: other.code().to_string(),
                        message: other.to_string(),
                    }),
                ),
            };
            VerificationReport {
                verification_id,
                ts: Utc::now(),
                outcome,
                artifacts,
                grading: None,
                compile_error,
                infra_error,
                rendered_hint,
                stage_trace,
            }
        }
    }
}
