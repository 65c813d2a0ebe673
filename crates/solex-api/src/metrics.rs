//! Prometheus counters for the verification surface.
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use solex_core::{ReportOutcome, VerificationReport};

pub struct Metrics {
    registry: Registry,
    verifications: IntCounter,
    compile_failures: IntCounter,
    infra_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let verifications =
            IntCounter::new("solex_verifications_total", "Verifications processed")?;
        let compile_failures = IntCounter::new(
            "solex_compile_failures_total",
            "Verifications that failed to compile",
        )?;
        let infra_failures = IntCounter::new(
            "solex_infra_failures_total",
            "Verifications lost to infrastructure faults",
        )?;
        registry.register(Box::new(verifications.clone()))?;
        registry.register(Box::new(compile_failures.clone()))?;
        registry.register(Box::new(infra_failures.clone()))?;
        Ok(Self {
            registry,
            verifications,
            compile_failures,
            infra_failures,
        })
    }

    pub fn record(&self, report: &VerificationReport) {
        self.verifications.inc();
        match report.outcome {
            ReportOutcome::CompileError => self.compile_failures.inc(),
            ReportOutcome::InfraFailure => self.infra_failures.inc(),
            _ => {}
        }
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn report(outcome: ReportOutcome) -> VerificationReport {
        VerificationReport {
            verification_id: "v1".into(),
            ts: Utc::now(),
            outcome,
            artifacts: BTreeMap::new(),
            grading: None,
            compile_error: None,
            infra_error: None,
            rendered_hint: String::new(),
            stage_trace: vec![],
        }
    }

    #[test]
    fn test_record_and_encode() {
        let metrics = Metrics::new().unwrap();
        metrics.record(&report(ReportOutcome::Passed));
        metrics.record(&report(ReportOutcome::CompileError));
        metrics.record(&report(ReportOutcome::InfraFailure));

        let text = metrics.encode().unwrap();
        assert!(text.contains("solex_verifications_total 3"));
        assert!(text.contains("solex_compile_failures_total 1"));
        assert!(text.contains("solex_infra_failures_total 1"));
    }
}
