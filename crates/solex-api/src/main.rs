//! Binary entrypoint for the Solex verification API.
use std::sync::Arc;

use solex_api::{metrics::Metrics, run, AppState};
use solex_chain::JsonRpcBackend;
use solex_core::VerifierConfig;
use solex_solc::SolcCompiler;
use solex_verify::Verifier;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let config = VerifierConfig::from_env();
    let compiler = Arc::new(SolcCompiler::from_config(&config));
    let backend = Arc::new(JsonRpcBackend::new(&config));
    let verifier = Arc::new(Verifier::new(compiler, backend, config));
    let metrics = Arc::new(Metrics::new().expect("metrics registry"));

    // Default listen address can be overridden with SOLEX_ADDR
    let addr = std::env::var("SOLEX_ADDR").unwrap_or_else(|_| "0.0.0.0:8798".to_string());
    run(&addr, AppState { verifier, metrics }).await;
}
